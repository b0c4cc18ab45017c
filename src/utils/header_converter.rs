//! Header格式转换工具
//! 不同Header格式之间的转换

use std::time::Instant;
use http::header::HeaderMap;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// 单次转换允许的最大Header条数
const MAX_HEADER_ENTRIES: usize = 1000;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为FxHashMap<String, Vec<String>>（Header名小写）
    pub fn to_hashmap(header_map: &HeaderMap) -> FxHashMap<String, Vec<String>> {
        let start = Instant::now();
        let mut map: FxHashMap<String, Vec<String>> = FxHashMap::default();

        for (iter_count, (key, value)) in header_map.iter().enumerate() {
            if iter_count >= MAX_HEADER_ENTRIES {
                warn!("Header迭代超过{}次，强制终止", MAX_HEADER_ENTRIES);
                break;
            }

            // 非可见ASCII的值按有损UTF-8处理
            let value_str = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };

            map.entry(key.as_str().to_ascii_lowercase())
                .or_default()
                .push(value_str);
        }

        debug!(
            "Header转换完成，耗时{:?}，生成{}条记录",
            start.elapsed(),
            map.len()
        );

        map
    }

    /// 将多值Header转换为单值Header：保留第一个非空值
    pub fn to_single_value(hashmap: &FxHashMap<String, Vec<String>>) -> FxHashMap<String, String> {
        let mut single_map = FxHashMap::default();
        for (key, values) in hashmap {
            if let Some(first_val) = values.iter().find(|v| !v.is_empty()) {
                single_map.insert(key.to_ascii_lowercase(), first_val.clone());
            }
        }
        single_map
    }
}
