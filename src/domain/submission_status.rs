/// 表单提交状态
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::Loading => "loading",
            SubmissionStatus::Success => "success",
            SubmissionStatus::Error => "error",
        }
    }

    /// `success` 与 `error` 在延迟后回到 `idle`
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Success | SubmissionStatus::Error)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
