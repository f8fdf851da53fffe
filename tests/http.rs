use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use std::net::TcpListener;
use std::path::PathBuf;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    data_path: PathBuf,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.data_path);
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[cfg(unix)]
mod cleanup {
    use std::sync::Mutex;
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().copied().filter(|pid| *pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("case_tracker_http_{}_{}.csv", std::process::id(), nanos));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        // any answer will do; a missing dataset still serves the empty-state page
        if client.get(format!("{base_url}/")).send().await.is_ok() {
            return;
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(dataset: Option<&str>) -> TestServer {
    spawn_server_logging(dataset, "info", Stdio::inherit()).await
}

async fn spawn_server_logging(dataset: Option<&str>, rust_log: &str, stdout: Stdio) -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    if let Some(contents) = dataset {
        std::fs::write(&data_path, contents).expect("write dataset");
    }

    let child = Command::new(env!("CARGO_BIN_EXE_case_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", &data_path)
        .env_remove("AWS_STORAGE_BUCKET_NAME")
        .env_remove("SKIP_FIRST_ROW")
        .env("RUST_LOG", rust_log)
        .stdout(stdout)
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
    }
}

/// Header, the anomalous first row, then fifteen days whose daily increase doubles from 5 to
/// 10 in the second week.
fn two_week_dataset() -> String {
    let mut text = String::from("Date,Case,New\n08/31/2020,0,0\n");
    let mut case = 100;
    for day in 1..=15 {
        if day > 1 {
            case += if day <= 8 { 5 } else { 10 };
        }
        text.push_str(&format!("09/{day:02}/2020,{case},1\n"));
    }
    text
}

async fn get_index(client: &Client, server: &TestServer) -> (StatusCode, String) {
    let response = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn http_index_renders_chart_and_weekly_change() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server(Some(&two_week_dataset())).await;
    let client = Client::new();

    let (status, body) = get_index(&client, &server).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("On average, new cases are up 100% week over week."));
    assert!(body.contains(r#""tick_labels":["Sep 01""#));
    assert!(!body.contains("2020-08-31"));
    assert!(body.contains("Average New Cases"));
}

#[tokio::test]
async fn http_index_reflects_appends_without_restart() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server(Some("Date,Case,New\n09/01/2020,0,0\n09/02/2020,80,3\n09/03/2020,85,5\n")).await;
    let client = Client::new();

    let (_, before) = get_index(&client, &server).await;
    assert!(before.contains("Sep 03"));
    assert!(!before.contains("Sep 04"));

    let mut contents = std::fs::read_to_string(&server.data_path).unwrap();
    contents.push_str("09/04/2020,90,5\n");
    std::fs::write(&server.data_path, contents).unwrap();

    let (status, after) = get_index(&client, &server).await;
    assert_eq!(status, StatusCode::OK);
    assert!(after.contains("Sep 04"));
}

#[tokio::test]
async fn http_missing_dataset_renders_unavailable_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server(None).await;
    let client = Client::new();

    let (status, body) = get_index(&client, &server).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("Case data is unavailable right now."));
    assert!(body.contains(r#"type="application/json">null</script>"#));
}

#[tokio::test]
async fn http_small_or_malformed_dataset_renders_empty_state() {
    let _guard = TEST_LOCK.lock().await;
    let client = Client::new();

    let single = spawn_server(Some("Date,Case,New\n09/01/2020,80,3\n")).await;
    let (status, body) = get_index(&client, &single).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Not enough data yet."));
    drop(single);

    let broken = spawn_server(Some("Date,Case,New\n09/01/2020,80,3\nnot-a-date,1,1\n")).await;
    let (status, body) = get_index(&client, &broken).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("could not be read"));
}

#[tokio::test]
async fn http_server_honours_rust_log() {
    let _guard = TEST_LOCK.lock().await;
    let mut server = spawn_server_logging(
        Some("Date,Case,New\n09/01/2020,0,0\n09/02/2020,80,3\n09/03/2020,85,5\n"),
        "debug",
        Stdio::piped(),
    )
    .await;
    let client = Client::new();

    let (status, _) = get_index(&client, &server).await;
    assert_eq!(status, StatusCode::OK);

    server.child.kill().unwrap();
    server.child.wait().unwrap();
    let mut logs = String::new();
    server
        .child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut logs)
        .unwrap();
    assert!(logs.contains("rendering dashboard"));
}
