//! 响应描述：由外部HTTP请求方提供的只读响应视图

use http::StatusCode;
use http::header::HeaderMap;
use rustc_hash::FxHashMap;

use crate::utils::HeaderConverter;

/// 响应描述（状态码 / Header / Body）
///
/// Header名统一小写存储，同名Header只保留第一次出现的值；
/// 状态码或Body缺失（如网络失败）时对应条件视为不匹配。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDescriptor {
    status_code: Option<u16>,
    headers: FxHashMap<String, String>,
    body: Option<String>,
}

impl ResponseDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 http 库的响应组成部分构建
    pub fn from_http_parts(status: Option<StatusCode>, headers: &HeaderMap, body: &[u8]) -> Self {
        let multi_value = HeaderConverter::to_hashmap(headers);
        Self {
            status_code: status.map(|s| s.as_u16()),
            headers: HeaderConverter::to_single_value(&multi_value),
            body: Some(String::from_utf8_lossy(body).into_owned()),
        }
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// 添加Header（已存在的同名Header不会被覆盖）
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 以有损UTF-8方式设置原始Body
    pub fn with_body_bytes(mut self, body: &[u8]) -> Self {
        self.body = Some(String::from_utf8_lossy(body).into_owned());
        self
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// 按名称查询Header（名称大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(value) => Some(value.as_str()),
            None => self.headers.get(&name.to_ascii_lowercase()).map(String::as_str),
        }
    }

    pub fn headers(&self) -> &FxHashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}
