use pmswitch_core::config::AppConfig;
use pmswitch_infrastructure::PmsPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "pmswitch.log";

/// Installs the global subscriber: a daily rolling file under the logs
/// directory, plus stderr when `verbose`.
///
/// `RUST_LOG` overrides `config.log_level`. The returned guard flushes the
/// file writer and must live until the process exits.
pub fn init_tracing(config: &AppConfig, paths: &PmsPaths, verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match paths.logs_dir() {
        Ok(logs_dir) => match std::fs::create_dir_all(&logs_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!(
                    "failed to create logs dir {}: {err}",
                    logs_dir.display()
                );
                (None, None)
            }
        },
        Err(err) => {
            eprintln!("failed to resolve logs dir: {err}");
            (None, None)
        }
    };

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("failed to install tracing subscriber: {err}");
    }

    guard
}
