use std::{fs, future, net::SocketAddr, path::Path, path::PathBuf};

use admin_ipc::{run_server, AdminRequest, DEFAULT_SOCKET_PATH};
use anyhow::{bail, Context};
use clap::Parser;
use storage::init_sqlite;
use tokio::task;
use tracing::{info, warn, Level};
use uuid::Uuid;
use web::{MetricsHandle, WebContext, DEFAULT_PING_MESSAGE};

mod dispatch;

use dispatch::Daemon;

const MEMORY_PREFIX: &str = "sqlite::memory:";
const URL_PREFIX: &str = "sqlite://";

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "SQLITE_PATH", default_value = "sqlite://agrivers.db")]
    sqlite_path: String,

    #[arg(long, env = "ADMIN_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    admin_socket: String,

    #[arg(long, env = "HTTP_ADDR", default_value = "127.0.0.1:8080")]
    http_addr: SocketAddr,

    #[arg(long, env = "SPA_DIR", default_value = "dist/spa")]
    spa_dir: PathBuf,

    #[arg(long, env = "PING_MESSAGE", default_value = DEFAULT_PING_MESSAGE)]
    ping_message: String,

    /// Browser local-storage dump to import before serving.
    #[arg(long)]
    import: Option<PathBuf>,
}

fn log_startup(args: &Args, run_id: &str) {
    info!(path = %args.sqlite_path, "sqlite path configured");
    info!(socket = %args.admin_socket, "admin socket bind planned");
    info!(addr = %args.http_addr, spa_dir = %args.spa_dir.display(), "http bind planned");
    if !args.spa_dir.join("index.html").is_file() {
        warn!(spa_dir = %args.spa_dir.display(), "no index.html in spa directory");
    }
    info!(%run_id, "run initialized");
}

fn validate_sqlite_path(path: &str) -> anyhow::Result<()> {
    if path.starts_with(MEMORY_PREFIX) {
        return Ok(());
    }
    let Some(rest) = path.strip_prefix(URL_PREFIX) else {
        bail!("sqlite path must start with `sqlite://` or use `sqlite::memory:`");
    };
    if sqlite_file_part(rest).is_empty() {
        bail!("sqlite path is missing a filesystem component after `sqlite://`");
    }
    Ok(())
}

fn ensure_sqlite_parent_dir(path: &str) -> anyhow::Result<()> {
    let Some(rest) = path.strip_prefix(URL_PREFIX) else {
        return Ok(());
    };
    if let Some(parent) = Path::new(sqlite_file_part(rest)).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating sqlite directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Filesystem part of a sqlite url body, without query parameters.
fn sqlite_file_part(rest: &str) -> &str {
    rest.split_once('?').map(|(path, _)| path).unwrap_or(rest)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    validate_sqlite_path(&args.sqlite_path)?;
    info!(
        sqlite = %args.sqlite_path,
        socket = %args.admin_socket,
        "booting marketd"
    );

    ensure_sqlite_parent_dir(&args.sqlite_path)?;

    let run_id = Uuid::new_v4().to_string();
    let store = init_sqlite(&args.sqlite_path).await?;
    log_startup(&args, &run_id);

    let missing_tables = store.validate_required_tables().await?;
    if !missing_tables.is_empty() {
        warn!(tables = ?missing_tables, "sqlite missing required tables");
        if let Err(err) = store
            .log_incident(
                "warning",
                "db_schema_missing",
                &format!(
                    "sqlite missing required tables: {}",
                    missing_tables.join(", ")
                ),
            )
            .await
        {
            warn!(error = ?err, "failed to log missing schema incident");
        }
    }

    if let Some(dump_path) = &args.import {
        let json = fs::read_to_string(dump_path)
            .with_context(|| format!("reading dump {}", dump_path.display()))?;
        let report = store.import_dump(&json).await?;
        info!(
            file = %dump_path.display(),
            rejected = report.rejected.len(),
            "import finished"
        );
    }

    let metrics = MetricsHandle::new()?;
    let daemon = Daemon {
        run_id: run_id.clone(),
        store: store.clone(),
        metrics: metrics.clone(),
    };
    let socket_path = args.admin_socket.clone();
    task::spawn(async move {
        let handler = move |req: AdminRequest| {
            let daemon = daemon.clone();
            async move { daemon.dispatch(req).await }
        };
        if let Err(err) = run_server(&socket_path, handler).await {
            tracing::error!(error = ?err, "admin ipc server failed");
        }
    });

    let web_ctx = WebContext {
        spa_dir: args.spa_dir.clone(),
        ping_message: args.ping_message.clone(),
        metrics,
    };
    let http_addr = args.http_addr;
    task::spawn(async move {
        if let Err(err) = web::serve(http_addr, web_ctx).await {
            tracing::error!(error = ?err, "http server error");
        }
    });

    info!(
        run_id = %run_id,
        sqlite = %args.sqlite_path,
        admin_socket = %args.admin_socket,
        http_addr = %args.http_addr,
        "ready"
    );
    if let Err(err) = store
        .log_incident("info", "ready", "marketd booted and ready")
        .await
    {
        warn!(error = ?err, "failed to record ready incident");
    }

    // keep running
    future::pending::<()>().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for VecWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let mut guard = self.0.lock().unwrap();
            guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for VecWriter {
        type Writer = VecWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn startup_logs_include_configuration() {
        let args = Args::parse_from([
            "marketd",
            "--sqlite-path",
            "sqlite:///tmp/agrivers-test.db",
            "--admin-socket",
            "/tmp/agrivers-test.sock",
            "--http-addr",
            "127.0.0.1:9000",
            "--spa-dir",
            "/nonexistent/spa",
        ]);
        let run_id = Uuid::nil().to_string();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = VecWriter(buffer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_writer(writer)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            log_startup(&args, &run_id);
        });

        let output =
            String::from_utf8(buffer.lock().unwrap().clone()).expect("log output should be utf8");
        assert!(output.contains("sqlite path configured"));
        assert!(output.contains("admin socket bind planned"));
        assert!(output.contains("http bind planned"));
        assert!(output.contains("no index.html in spa directory"));
        assert!(output.contains("run initialized"));
        assert!(output.contains(&args.sqlite_path));
        assert!(output.contains(&args.admin_socket));
        assert!(output.contains(&args.http_addr.to_string()));
        assert!(output.contains(&run_id));
        assert_eq!(args.ping_message, "ping");
        assert!(args.import.is_none());
    }

    #[test]
    fn validates_memory_and_file_urls() {
        validate_sqlite_path("sqlite::memory:?cache=shared").expect("memory dsn should validate");
        validate_sqlite_path("sqlite://agrivers.db").expect("relative file url should validate");
        validate_sqlite_path("sqlite:///var/lib/agrivers/market.db?mode=rwc")
            .expect("absolute file url should validate");
    }

    #[test]
    fn rejects_missing_or_invalid_urls() {
        let err = validate_sqlite_path("agrivers.db").expect_err("should reject plain filename");
        assert!(err
            .to_string()
            .contains("must start with `sqlite://` or use `sqlite::memory:`"));

        let err = validate_sqlite_path("sqlite://?mode=rwc").expect_err("should reject empty path");
        assert!(err
            .to_string()
            .contains("missing a filesystem component after `sqlite://`"));
    }

    #[test]
    fn creates_parent_directory_for_file_urls() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("nested").join("data").join("market.db");
        let url = format!("sqlite://{}?mode=rwc", db.display());

        ensure_sqlite_parent_dir(&url).expect("parent dir creation should succeed");
        assert!(db.parent().unwrap().is_dir());

        ensure_sqlite_parent_dir("sqlite::memory:").expect("memory urls are skipped");
        assert_eq!(sqlite_file_part("a/b.db?cache=shared"), "a/b.db");
    }
}
