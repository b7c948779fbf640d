//! In-memory fakes of the domain ports for service tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local};
use mockall::mock;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::RwLock;

use dormcheck_domain::notification::{NotificationMessage, NotificationSender};
use dormcheck_domain::platform::{
    Activity, CaptchaChallenge, CaptchaSolver, LoginReply, PlatformClient, PlatformError,
    SignInForm, SignInReply,
};
use dormcheck_domain::session::{CookieSet, Session, SessionRepository};
use dormcheck_domain::task::{SignTask, SignTaskRepository};
use dormcheck_domain::{AccountId, DomainError, OwnerId, TaskId};

mock! {
    pub Solver {}

    #[async_trait]
    impl CaptchaSolver for Solver {
        async fn recognize(&self, image_data_uri: &str) -> Result<String, PlatformError>;
    }
}

// ============================================================
// Platform
// ============================================================

#[derive(Clone)]
pub struct LoginCall {
    pub account_id: String,
    pub captcha_code: String,
    pub correlation: CookieSet,
}

struct PlatformState {
    captcha_cookies: Vec<(String, String)>,
    captcha_fetches: usize,
    login_replies: VecDeque<Result<LoginReply, PlatformError>>,
    logins: Vec<LoginCall>,
    sign_in_replies: VecDeque<Result<SignInReply, PlatformError>>,
    sign_ins: Vec<(CookieSet, SignInForm)>,
    activities: Vec<Activity>,
    display_name: Option<String>,
}

/// Scripted platform. Unscripted logins are rejected, unscripted sign-ins succeed.
pub struct FakePlatform {
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlatformState {
                captcha_cookies: vec![
                    ("Vlis".to_string(), "v".to_string()),
                    ("VK_".to_string(), "k".to_string()),
                ],
                captcha_fetches: 0,
                login_replies: VecDeque::new(),
                logins: Vec::new(),
                sign_in_replies: VecDeque::new(),
                sign_ins: Vec::new(),
                activities: Vec::new(),
                display_name: None,
            }),
        }
    }

    pub fn login_ok(token: &str) -> LoginReply {
        LoginReply {
            is_ok: true,
            message: "登录成功".to_string(),
            set_cookie_headers: vec![
                "ct_vali=decoy; path=/".to_string(),
                format!("ct_vali={token}; path=/; HttpOnly"),
            ],
        }
    }

    pub fn login_rejected(message: &str) -> LoginReply {
        LoginReply {
            is_ok: false,
            message: message.to_string(),
            set_cookie_headers: Vec::new(),
        }
    }

    pub fn set_captcha_cookies(&self, cookies: &[(&str, &str)]) {
        self.state.lock().unwrap().captcha_cookies = cookies
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
    }

    pub fn push_login(&self, reply: LoginReply) {
        self.state.lock().unwrap().login_replies.push_back(Ok(reply));
    }

    pub fn push_login_error(&self, err: PlatformError) {
        self.state.lock().unwrap().login_replies.push_back(Err(err));
    }

    pub fn push_sign_in(&self, reply: Result<SignInReply, PlatformError>) {
        self.state.lock().unwrap().sign_in_replies.push_back(reply);
    }

    pub fn set_activities(&self, activities: Vec<Activity>) {
        self.state.lock().unwrap().activities = activities;
    }

    pub fn set_display_name(&self, name: &str) {
        self.state.lock().unwrap().display_name = Some(name.to_string());
    }

    pub fn captcha_fetches(&self) -> usize {
        self.state.lock().unwrap().captcha_fetches
    }

    pub fn logins(&self) -> Vec<LoginCall> {
        self.state.lock().unwrap().logins.clone()
    }

    pub fn sign_ins(&self) -> Vec<(CookieSet, SignInForm)> {
        self.state.lock().unwrap().sign_ins.clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.captcha_fetches += 1;
        let cookies = CookieSet::from_pairs(state.captcha_cookies.clone());
        CaptchaChallenge::new("data:image/png;base64,iVBORw0K".to_string(), &cookies)
    }

    async fn login(
        &self,
        account_id: &AccountId,
        _secret: &str,
        captcha_code: &str,
        correlation: &CookieSet,
    ) -> Result<LoginReply, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.logins.push(LoginCall {
            account_id: account_id.as_str().to_string(),
            captcha_code: captcha_code.to_string(),
            correlation: correlation.clone(),
        });
        state
            .login_replies
            .pop_front()
            .unwrap_or_else(|| Ok(Self::login_rejected("unscripted login")))
    }

    async fn list_activities(&self, _cookies: &CookieSet) -> Result<Vec<Activity>, PlatformError> {
        Ok(self.state.lock().unwrap().activities.clone())
    }

    async fn submit_sign_in(
        &self,
        cookies: &CookieSet,
        form: &SignInForm,
    ) -> Result<SignInReply, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.sign_ins.push((cookies.clone(), form.clone()));
        state.sign_in_replies.pop_front().unwrap_or_else(|| {
            Ok(SignInReply {
                is_ok: true,
                message: "签到成功".to_string(),
            })
        })
    }

    async fn fetch_display_name(
        &self,
        _cookies: &CookieSet,
    ) -> Result<Option<String>, PlatformError> {
        Ok(self.state.lock().unwrap().display_name.clone())
    }
}

// ============================================================
// Repositories
// ============================================================

#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<SignTask>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &TaskId) -> Option<SignTask> {
        self.tasks.read().await.iter().find(|t| t.id() == id).cloned()
    }
}

fn same_key(task: &SignTask, owner_id: OwnerId, account_id: &AccountId, activity_id: &str) -> bool {
    task.owner_id() == owner_id && task.account_id() == account_id && task.activity_id() == activity_id
}

#[async_trait]
impl SignTaskRepository for InMemoryTaskRepository {
    async fn save(&self, task: &SignTask) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().await;
        match tasks
            .iter_mut()
            .find(|t| same_key(t, task.owner_id(), task.account_id(), task.activity_id()))
        {
            Some(existing) => {
                let id = existing.id().clone();
                let created_at = existing.created_at();
                *existing = SignTask::restore(
                    id,
                    task.owner_id(),
                    task.account_id().clone(),
                    task.activity_id().to_string(),
                    task.details().clone(),
                    task.is_enabled(),
                    task.execution().clone(),
                    created_at,
                );
            }
            None => tasks.push(task.clone()),
        }
        Ok(())
    }

    async fn update_execution(&self, task: &SignTask) -> Result<(), DomainError> {
        let mut tasks = self.tasks.write().await;
        let existing = tasks
            .iter_mut()
            .find(|t| t.id() == task.id())
            .ok_or_else(|| DomainError::TaskNotFound(task.id().to_string()))?;
        *existing = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<SignTask>, DomainError> {
        Ok(self.get(id).await)
    }

    async fn find_by_key(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<Option<SignTask>, DomainError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .find(|t| same_key(t, owner_id, account_id, activity_id))
            .cloned())
    }

    async fn find_by_owner(&self, owner_id: OwnerId) -> Result<Vec<SignTask>, DomainError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.owner_id() == owner_id)
            .cloned()
            .collect())
    }

    async fn find_due(
        &self,
        now: DateTime<Local>,
        cooldown: Duration,
    ) -> Result<Vec<SignTask>, DomainError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| t.is_due(&now, cooldown))
            .cloned()
            .collect())
    }

    async fn delete(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
        activity_id: &str,
    ) -> Result<bool, DomainError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| !same_key(t, owner_id, account_id, activity_id));
        Ok(tasks.len() != before)
    }

    async fn exists_for_account(
        &self,
        owner_id: OwnerId,
        account_id: &AccountId,
    ) -> Result<bool, DomainError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .any(|t| t.owner_id() == owner_id && t.account_id() == account_id))
    }

    async fn reset_all(&self) -> Result<u64, DomainError> {
        let mut tasks = self.tasks.write().await;
        for task in tasks.iter_mut() {
            task.reset_daily();
        }
        Ok(tasks.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<BTreeMap<AccountId, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.account_id().clone(), session);
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        self.insert(session.clone()).await;
        Ok(())
    }

    async fn find_by_account_id(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(account_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Session>, DomainError> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}

// ============================================================
// Notifications
// ============================================================

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, NotificationMessage)>>,
    fail: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, NotificationMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, recipient: &str, message: &NotificationMessage) -> Result<(), DomainError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.clone()));
        if self.fail {
            return Err(DomainError::Infrastructure("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

// ============================================================
// Fixtures
// ============================================================

pub fn session(account: &str) -> Session {
    Session::new(
        AccountId::new(account).unwrap(),
        "plat-password".to_string(),
        CookieSet::from_pairs([("qyuserid", account), ("utpstr", "1"), ("ct_vali", "TOKEN")]),
        "张三".to_string(),
    )
    .unwrap()
}
