use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use jjz_renewal::clients::permit_client::APPLY_PATH;
use jjz_renewal::clients::{IdentityProvider, PermitApi};
use jjz_renewal::config::{UserConfig, UserConfigStore};
use jjz_renewal::models::{
    AccountStatus, ApiResponse, ApplicationRequest, AttemptResult, FormVersion, UserIdentity, VehicleRecord,
};
use jjz_renewal::services::decision_service::Decision;
use jjz_renewal::services::renewal_service::{TITLE_STATE_FAILED, TITLE_SUBMIT_FAILED, TITLE_TOKEN_INVALID};
use jjz_renewal::services::{run_batch, Notifier, RenewalOptions, RenewalOutcome, RenewalService};
use jjz_renewal::utils::errors::{upstream_error, AppError, AppResult};

const VALID_TOKEN: &str = "valid-token";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

fn now() -> NaiveDateTime {
    today().and_hms_opt(8, 0, 0).unwrap()
}

fn record(label: &str, start: &str, end: Option<&str>, apply_id: &str) -> Value {
    json!({
        "vId": "v-001",
        "applyId": apply_id,
        "blztmc": label,
        "yxqs": start,
        "yxqz": end,
        "jjzzlmc": "进京证(六环内)",
        "sqsj": "2024-03-01 08:00:00",
        "hphm": "冀A12345",
    })
}

fn state_json(primary: Value, secondary: Value) -> Value {
    json!({
        "sfzmhm": "110101199001011234",
        "bzclxx": [{
            "vId": "v-001",
            "hphm": "冀A12345",
            "hpzl": "02",
            "sycs": "8",
            "syts": "40",
            "ylzsfkb": true,
            "bzxx": primary,
            "ecbzxx": secondary,
        }]
    })
}

fn vehicle() -> VehicleRecord {
    serde_json::from_value(json!({ "hphm": "冀A12345", "hpzl": "02", "cllx": "01", "vId": "v-001" })).unwrap()
}

/// API de permisos en memoria
struct FakeApi {
    states: Mutex<VecDeque<Value>>,
    vehicles: Vec<VehicleRecord>,
    fail_state: bool,
    identity: UserIdentity,
    submit_error: Option<(i64, String)>,
    submitted: Mutex<Vec<Value>>,
    state_calls: Mutex<u32>,
}

impl FakeApi {
    fn new(states: Vec<Value>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            vehicles: vec![vehicle()],
            fail_state: false,
            identity: UserIdentity {
                name: "张三".into(),
                id_number: "110101199001011234".into(),
            },
            submit_error: None,
            submitted: Mutex::new(Vec::new()),
            state_calls: Mutex::new(0),
        }
    }

    fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }

    fn state_calls(&self) -> u32 {
        *self.state_calls.lock().unwrap()
    }
}

fn check_token(token: &str, endpoint: &str) -> AppResult<()> {
    if token == VALID_TOKEN || token == "fresh-token" {
        Ok(())
    } else {
        Err(upstream_error(endpoint, 401, "token已失效"))
    }
}

#[async_trait]
impl PermitApi for FakeApi {
    async fn fetch_state(&self, token: &str) -> AppResult<AccountStatus> {
        check_token(token, "stateList")?;
        *self.state_calls.lock().unwrap() += 1;
        if self.fail_state {
            return Err(upstream_error("stateList", 500, "系统繁忙"));
        }
        let mut states = self.states.lock().unwrap();
        let data = if states.len() > 1 {
            states.pop_front().unwrap_or(Value::Null)
        } else {
            states.front().cloned().unwrap_or(Value::Null)
        };
        AccountStatus::from_api_data(data)
    }

    async fn list_vehicles(&self, token: &str) -> AppResult<Vec<VehicleRecord>> {
        check_token(token, "getUserIdInfo")?;
        Ok(self.vehicles.clone())
    }

    async fn get_user_identity(&self, token: &str) -> AppResult<UserIdentity> {
        check_token(token, "getJsrxx")?;
        Ok(self.identity.clone())
    }

    async fn submit(&self, token: &str, request: &ApplicationRequest) -> AppResult<ApiResponse> {
        check_token(token, APPLY_PATH)?;
        if let Some((code, message)) = &self.submit_error {
            return Err(upstream_error(APPLY_PATH, *code, message));
        }
        self.submitted.lock().unwrap().push(serde_json::to_value(request).unwrap());
        Ok(ApiResponse {
            code: 200,
            msg: "申请成功".into(),
            data: Value::Null,
        })
    }

    async fn add_vehicle(&self, _token: &str, _vehicle: &VehicleRecord) -> AppResult<ApiResponse> {
        unimplemented!("not used by the pipeline")
    }

    async fn delete_vehicle(&self, _token: &str, _vehicle_id: &str) -> AppResult<ApiResponse> {
        unimplemented!("not used by the pipeline")
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn titles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(title, _)| title.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, title: &str, body: &str) {
        self.sent.lock().unwrap().push((title.to_string(), body.to_string()));
    }
}

struct AlwaysLogsIn;

#[async_trait]
impl IdentityProvider for AlwaysLogsIn {
    async fn attempt_login(&self, _phone: &str, _password: &str) -> AttemptResult {
        AttemptResult::Redirect("https://bjjj.jtgl.beijing.gov.cn/uc/ucfront/userauth?code=1".into())
    }

    async fn exchange_token(&self, _redirect_url: &str) -> AppResult<String> {
        Ok("fresh-token".into())
    }
}

struct RejectsLogin;

#[async_trait]
impl IdentityProvider for RejectsLogin {
    async fn attempt_login(&self, _phone: &str, _password: &str) -> AttemptResult {
        AttemptResult::WrongCredentials("用户名或密码错误".into())
    }

    async fn exchange_token(&self, _redirect_url: &str) -> AppResult<String> {
        unimplemented!("login never succeeds")
    }
}

fn token_user(name: &str) -> UserConfig {
    let mut user = UserConfig::new(name);
    user.auth = Some(VALID_TOKEN.into());
    user
}

#[tokio::test]
async fn test_active_permit_expiring_today_renews_for_tomorrow() {
    let api = FakeApi::new(vec![
        state_json(json!([record("审核通过(生效中)", "2024-02-28", Some("2024-03-05"), "APPLY-1")]), json!([])),
        state_json(
            json!([
                record("审核中", "2024-03-06", None, "APPLY-2"),
                record("审核通过(生效中)", "2024-02-28", Some("2024-03-05"), "APPLY-1")
            ]),
            json!([]),
        ),
    ]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let report = service.run(&token_user("alice"), today(), now()).await.unwrap();

    let tomorrow = today() + Duration::days(1);
    assert_eq!(report.decision, Decision::RenewTomorrow(tomorrow));
    assert!(matches!(report.outcome, RenewalOutcome::Submitted { target_date, .. } if target_date == tomorrow));
    assert_eq!(report.refreshed_token, None);

    let submitted = api.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["jjrq"], "2024-03-06");
    assert_eq!(submitted[0]["applyIdOld"], "APPLY-1");
    assert_eq!(submitted[0]["vId"], "v-001");
    assert_eq!(submitted[0]["area"], "海淀区");
    assert_eq!(api.state_calls(), 2);

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "进京证续签成功: 03-06~03-12");
    assert!(sent[0].1.contains("状态: 审核中"));
    assert!(sent[0].1.contains("剩余申请次数: 8"));
}

#[tokio::test]
async fn test_first_application_without_records() {
    let api = FakeApi::new(vec![
        state_json(json!([]), json!([])),
        state_json(json!([record("审核中", "2024-03-05", None, "APPLY-9")]), json!([])),
    ]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let report = service.run(&token_user("bob"), today(), now()).await.unwrap();

    assert_eq!(report.decision, Decision::FirstApplication(today()));
    let submitted = api.submitted();
    assert_eq!(submitted[0]["jjrq"], "2024-03-05");
    assert_eq!(submitted[0]["applyIdOld"], "");
    assert_eq!(notifier.titles(), vec!["进京证续签成功: 03-05~03-11"]);
}

#[tokio::test]
async fn test_under_review_needs_nothing() {
    let api = FakeApi::new(vec![state_json(
        json!([record("审核中", "2024-03-06", None, "APPLY-3")]),
        json!([]),
    )]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let report = service.run(&token_user("carol"), today(), now()).await.unwrap();

    assert_eq!(report.outcome, RenewalOutcome::NotNeeded);
    assert!(api.submitted().is_empty());
    assert_eq!(api.state_calls(), 1);
    assert_eq!(notifier.titles(), vec!["进京证无需续签: 03-06~03-12"]);
}

#[tokio::test]
async fn test_secondary_list_takes_precedence() {
    let api = FakeApi::new(vec![state_json(
        json!([record("审核通过(生效中)", "2024-03-01", Some("2024-03-20"), "PRIMARY")]),
        json!([record("审核不通过", "2024-03-06", None, "SECONDARY")]),
    )]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let report = service.run(&token_user("dave"), today(), now()).await.unwrap();

    assert_eq!(report.decision, Decision::Reapply(today()));
    assert_eq!(api.submitted()[0]["applyIdOld"], "SECONDARY");
}

#[tokio::test]
async fn test_legacy_form_version() {
    let api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    let notifier = RecordingNotifier::default();
    let options = RenewalOptions {
        form_version: FormVersion::V1,
        ..RenewalOptions::default()
    };
    let service = RenewalService::new(&api, &notifier, options);

    service.run(&token_user("erin"), today(), now()).await.unwrap();

    let submitted = api.submitted();
    assert_eq!(submitted[0]["jjdq"], "010");
    assert_eq!(submitted[0]["jjlk"], "00606");
    assert!(submitted[0].get("area").is_none());
}

#[tokio::test]
async fn test_dry_run_does_not_submit() {
    let api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    let notifier = RecordingNotifier::default();
    let options = RenewalOptions {
        dry_run: true,
        notify: false,
        ..RenewalOptions::default()
    };
    let service = RenewalService::new(&api, &notifier, options);

    let report = service.run(&token_user("frank"), today(), now()).await.unwrap();

    assert_eq!(report.outcome, RenewalOutcome::DryRun { target_date: today() });
    assert!(api.submitted().is_empty());
    assert!(notifier.titles().is_empty());
    assert!(report.summary.is_none());
}

#[tokio::test]
async fn test_no_vehicle_is_reported() {
    let mut api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    api.vehicles.clear();
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let err = service.run(&token_user("gina"), today(), now()).await.unwrap_err();

    assert!(matches!(&err, AppError::DataAbsent(message) if message == "no vehicle found"));
    assert_eq!(notifier.titles(), vec![TITLE_SUBMIT_FAILED]);
}

#[tokio::test]
async fn test_submit_failure_ends_pipeline() {
    let mut api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    api.submit_error = Some((500, "系统繁忙".into()));
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let err = service.run(&token_user("hank"), today(), now()).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamProtocol { code: 500, .. }));
    assert_eq!(api.state_calls(), 1);
    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, TITLE_SUBMIT_FAILED);
    assert!(sent[0].1.contains("系统繁忙"));
}

#[tokio::test]
async fn test_state_failure_is_notified() {
    let mut api = FakeApi::new(vec![]);
    api.fail_state = true;
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let err = service.run(&token_user("ivy"), today(), now()).await.unwrap_err();

    assert_eq!(err.error_code(), "UPSTREAM_ERROR");
    assert_eq!(notifier.titles(), vec![TITLE_STATE_FAILED]);
}

#[tokio::test]
async fn test_state_without_payload_submits_nothing() {
    let api = FakeApi::new(vec![Value::Null]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let err = service.run(&token_user("lena"), today(), now()).await.unwrap_err();

    assert_eq!(err.error_code(), "DATA_ABSENT");
    assert!(api.submitted().is_empty());
    assert_eq!(notifier.titles(), vec![TITLE_STATE_FAILED]);
}

#[tokio::test]
async fn test_incomplete_identity_is_never_submitted() {
    let mut api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    api.identity = UserIdentity::default();
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let err = service.run(&token_user("mike"), today(), now()).await.unwrap_err();

    assert!(matches!(&err, AppError::DataAbsent(message) if message == "no user identity found"));
    assert!(api.submitted().is_empty());
    assert_eq!(notifier.titles(), vec![TITLE_SUBMIT_FAILED]);
}

#[tokio::test]
async fn test_silent_run_does_not_report_login_failure() {
    let api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    let notifier = RecordingNotifier::default();
    let identity = RejectsLogin;
    let options = RenewalOptions {
        dry_run: true,
        notify: false,
        ..RenewalOptions::default()
    };
    let service = RenewalService::new(&api, &notifier, options).with_identity_provider(&identity);

    let mut user = UserConfig::new("nora");
    user.auth = Some("stale".into());
    user.phone = Some("13800138000".into());
    user.password = Some("wrong".into());
    let err = service.run(&user, today(), now()).await.unwrap_err();

    assert!(matches!(err, AppError::Authentication(_)));
    assert!(notifier.titles().is_empty());
    assert_eq!(api.state_calls(), 0);
}

#[tokio::test]
async fn test_expired_token_without_credentials() {
    let api = FakeApi::new(vec![state_json(json!([]), json!([]))]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let mut user = UserConfig::new("jack");
    user.auth = Some("stale".into());
    let err = service.run(&user, today(), now()).await.unwrap_err();

    assert!(matches!(err, AppError::UpstreamProtocol { code: 401, .. }));
    assert_eq!(notifier.titles(), vec![TITLE_TOKEN_INVALID]);
    assert_eq!(api.state_calls(), 0);
}

#[tokio::test]
async fn test_expired_token_triggers_login_and_persists() {
    let path = std::env::temp_dir().join(format!("jjz-pipeline-{}.json", std::process::id()));
    tokio::fs::write(
        &path,
        r#"[{"name":"kate","auth":"stale","phone":"13800138000","password":"secret"}]"#,
    )
    .await
    .unwrap();
    let store = UserConfigStore::new(&path);
    let users = store.load().await.unwrap();

    let api = FakeApi::new(vec![state_json(
        json!([record("审核通过(待生效)", "2024-03-06", Some("2024-03-12"), "APPLY-5")]),
        json!([]),
    )]);
    let notifier = RecordingNotifier::default();
    let identity = AlwaysLogsIn;
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default())
        .with_identity_provider(&identity)
        .with_store(&store);

    let report = service.run(&users[0], today(), now()).await.unwrap();

    assert_eq!(report.refreshed_token.as_deref(), Some("fresh-token"));
    assert_eq!(report.outcome, RenewalOutcome::NotNeeded);
    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded[0].token(), Some("fresh-token"));

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let api = FakeApi::new(vec![state_json(
        json!([record("审核中", "2024-03-06", None, "APPLY-3")]),
        json!([]),
    )]);
    let notifier = RecordingNotifier::default();
    let service = RenewalService::new(&api, &notifier, RenewalOptions::default());

    let mut stale = UserConfig::new("stale");
    stale.auth = Some("expired".into());
    let users = vec![token_user("ok"), UserConfig::new("unconfigured"), stale, token_user("also-ok")];

    let service = &service;
    let summary = run_batch(users, |user| async move { service.run(&user, today(), now()).await }).await;

    assert_eq!(summary.succeeded, vec!["ok", "also-ok"]);
    assert_eq!(summary.skipped, vec!["unconfigured"]);
    assert_eq!(summary.failed, vec![("stale".to_string(), "UPSTREAM_ERROR".to_string())]);
    assert_eq!(summary.total(), 4);
    assert!(!summary.all_failed());
}
