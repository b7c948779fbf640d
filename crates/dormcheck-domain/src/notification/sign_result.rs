use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::sender::NotificationMessage;

/// Result of one sign-in attempt, addressed to the task's notify email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignResultNotice {
    pub recipient: String,
    pub display_name: String,
    pub activity_name: String,
    pub success: bool,
    pub error: String,
    pub sent_at: DateTime<Local>,
}

impl SignResultNotice {
    pub const TITLE: &'static str = "签到结果通知";

    pub fn to_message(&self) -> NotificationMessage {
        let mut lines = vec![
            format!("您好，以下是 {} 的签到任务结果：", self.display_name),
            format!("活动名称：{}", self.activity_name),
        ];

        if self.success {
            lines.push("✔️ 签到成功".to_string());
        } else {
            lines.push("❌ 签到失败".to_string());
            lines.push(format!("失败原因：{}", self.error));
        }

        lines.push(format!(
            "发送时间：{}",
            self.sent_at.format("%Y-%m-%d %H:%M:%S")
        ));

        NotificationMessage::new(Self::TITLE, lines.join("\n"))
    }
}
