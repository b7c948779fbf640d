use serde::{Deserialize, Serialize};

/// URLs of the attendance platform. Defaults are the production hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformEndpoints {
    pub captcha_url: String,
    pub login_url: String,
    pub activity_list_url: String,
    pub sign_in_url: String,
    pub profile_url: String,
}

impl Default for PlatformEndpoints {
    fn default() -> Self {
        Self {
            captcha_url: "http://plat.swmu.edu.cn/Authentication/GetValidateCode".to_string(),
            login_url: "http://plat.swmu.edu.cn/MyAuthentication/put/".to_string(),
            activity_list_url:
                "http://plat.swmu.edu.cn/studentwork/PunchMStudent/GetActivityList".to_string(),
            sign_in_url: "http://plat.swmu.edu.cn/studentwork/PunchMStudent/SubmitSignin"
                .to_string(),
            profile_url: "http://me.swmu.edu.cn/studentwork/StudentManager/Detail".to_string(),
        }
    }
}

impl PlatformEndpoints {
    /// Every endpoint under one base URL, for pointing the client at a test server
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            captcha_url: format!("{base}/Authentication/GetValidateCode"),
            login_url: format!("{base}/MyAuthentication/put/"),
            activity_list_url: format!("{base}/studentwork/PunchMStudent/GetActivityList"),
            sign_in_url: format!("{base}/studentwork/PunchMStudent/SubmitSignin"),
            profile_url: format!("{base}/studentwork/StudentManager/Detail"),
        }
    }
}
