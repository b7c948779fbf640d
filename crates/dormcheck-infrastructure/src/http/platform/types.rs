use serde::Deserialize;

use dormcheck_domain::platform::Activity;

/// Profile and sign-in calls only need a generic browser agent
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Sign-in submission is sent with the bare agent string
pub const SIGN_IN_USER_AGENT: &str = "Mozilla/5.0";

/// `{isok, msg, code}` verdict shared by login and sign-in
#[derive(Debug, Deserialize)]
pub(super) struct VerdictResponse {
    #[serde(default)]
    pub isok: bool,
    #[serde(default)]
    pub msg: Option<String>,
}

impl VerdictResponse {
    pub fn message(self) -> String {
        self.msg.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityListResponse {
    #[serde(default)]
    pub data: Option<Vec<ActivityRecord>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub foreachp_starttime: Option<String>,
    #[serde(default)]
    pub foreachp_endtime: Option<String>,
    #[serde(default)]
    pub foreachp_startday: Option<String>,
    #[serde(default)]
    pub foreachp_endday: Option<String>,
    #[serde(default)]
    pub collegeview: Option<String>,
    #[serde(default)]
    pub sigintaskview: Option<String>,
}

impl From<ActivityRecord> for Activity {
    fn from(record: ActivityRecord) -> Self {
        Activity {
            id: record.id,
            name: record.name.unwrap_or_default(),
            start_time: record.foreachp_starttime.unwrap_or_default(),
            end_time: record.foreachp_endtime.unwrap_or_default(),
            start_day: record.foreachp_startday.unwrap_or_default(),
            end_day: record.foreachp_endday.unwrap_or_default(),
            college_view: record.collegeview.unwrap_or_default(),
            sign_task_view: record.sigintaskview.unwrap_or_default(),
        }
    }
}
