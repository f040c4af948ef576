use crate::error::InitError;
use crate::layer::ForwardLayer;
use crate::pipeline::LogPipeline;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Конфигурация логгера для [`init_tracing_with_config`].
///
/// Управляет минимальным уровнем событий, которые попадают в pipeline,
/// а также тем, нужно ли дополнительно печатать логи в консоль через
/// `fmt`‑слой.
///
/// **Поля**
/// - `min_level`: минимальный уровень, который уходит в pipeline (и в
///   консоль, если она включена).
/// - `enable_stdout`: если `true`, поверх [`ForwardLayer`] добавляется
///   `tracing_subscriber::fmt::Layer` и события печатаются в stderr.
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::DEBUG,
            enable_stdout: true,
        }
    }
}

/// Build the subscriber that routes events into `pipeline`.
///
/// Exposed separately from [`init_tracing_with_config`] so callers can
/// scope it with `tracing::subscriber::with_default`.
pub fn subscriber(
    pipeline: &LogPipeline,
    config: &LoggerConfig,
) -> impl tracing::Subscriber + Send + Sync {
    // Слой, который кладёт записи в pipeline, подключаем всегда.
    // `fmt`‑слой опционален; `Option<Layer>` сам является слоем, поэтому
    // тип subscriber'а один в обоих вариантах.
    let layer = ForwardLayer::with_min_level(pipeline.clone(), config.min_level);
    let fmt_layer = config.enable_stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::from_level(config.min_level))
    });
    Registry::default().with(layer).with(fmt_layer)
}

/// Install the pipeline's subscriber as the global default.
///
/// **Parameters**
/// - `pipeline`: the [`LogPipeline`] records are emitted into.
/// - `config`: [`LoggerConfig`] controlling level and console output.
///
/// **Returns**
/// - `Err(InitError::AlreadySet)` if a global subscriber was already
///   installed; the process keeps the existing one.
pub fn init_tracing_with_config(
    pipeline: &LogPipeline,
    config: LoggerConfig,
) -> Result<(), InitError> {
    tracing::subscriber::set_global_default(subscriber(pipeline, &config))?;
    Ok(())
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LoggerConfig::default`].
pub fn init_tracing(pipeline: &LogPipeline) -> Result<(), InitError> {
    init_tracing_with_config(pipeline, LoggerConfig::default())
}
