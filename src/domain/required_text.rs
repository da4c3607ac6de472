use super::ContactField;

/// 非空文本
///
/// 与表单行为保持一致：不做 trim，也不校验邮箱格式，只拒绝空字符串。
#[derive(Debug, Clone)]
pub struct RequiredText(String);

impl RequiredText {
    pub fn parse(field: ContactField, s: String) -> Result<RequiredText, String> {
        if s.is_empty() {
            return Err(format!("`{}` is required.", field.as_str()));
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for RequiredText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
