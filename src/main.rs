use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use error::BongoError;
use events::SessionMode;
use services::{create_clicker, create_detector, SessionController, VirtualDevice};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Печать + клик по сундуку каждый цикл
    Typing,
    /// Только клик по сундуку каждый цикл
    ChestOnly,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Typing => SessionMode::Typing,
            ModeArg::ChestOnly => SessionMode::ChestOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bongo-rust")]
#[command(about = "Бот для автоматизации idle-игры Bongo Cat")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "bongo.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Режим сессии
    #[arg(long, value_enum, default_value_t = ModeArg::Typing)]
    mode: ModeArg,

    /// Число циклов в режиме печати
    #[arg(long, default_value_t = 30)]
    cycles: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск Bongo Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else {
        // Проверка прав доступа (инъекция клавиш и захват экрана)
        utils::permissions::check_permissions()?;
    }

    // Инициализация компонентов (создаём единое виртуальное устройство и передаём сервисам)
    let virtual_device = Arc::new(VirtualDevice::new("Bongo-Rust Virtual Device", args.dry_run)?);
    let detector = create_detector(config.clone(), args.dry_run)?;
    let clicker = create_clicker(args.dry_run)?;
    let shutdown = Arc::new(AtomicBool::new(false));

    let controller = Arc::new(SessionController::new(
        config.clone(),
        detector,
        clicker,
        virtual_device.clone(),
        shutdown.clone(),
        args.cycles,
    ));

    info!("Все компоненты инициализированы");

    // Запуск сессии в отдельной задаче
    let mode = SessionMode::from(args.mode);
    let session_controller = Arc::clone(&controller);
    let mut session_handle = tokio::spawn(async move { session_controller.run(mode).await });

    tokio::select! {
        result = &mut session_handle => {
            match result {
                Ok(Ok(())) => info!("Сессия завершена"),
                Ok(Err(BongoError::Cancelled)) => info!("Сессия отменена"),
                Ok(Err(e)) => error!("Сессия завершилась с ошибкой: {}", e),
                Err(e) => error!("Задача сессии аварийно завершилась: {}", e),
            }
        }
        signal_result = signal::ctrl_c() => {
            match signal_result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }

            info!("Завершение работы...");
            shutdown.store(true, Ordering::Relaxed);

            // Ожидаем корректного завершения сессии (с таймаутом)
            let shutdown_timeout = tokio::time::Duration::from_secs(10);
            match tokio::time::timeout(shutdown_timeout, &mut session_handle).await {
                Ok(_) => info!("Сессия завершила работу корректно"),
                Err(_) => {
                    warn!("Таймаут при завершении сессии - прерываем задачу");
                    session_handle.abort();
                    let _ = session_handle.await;
                }
            }
        }
    }

    // Дополнительно гарантируем отсутствие залипших клавиш: релизим все
    if let Err(e) = virtual_device.release_all() {
        warn!("Не удалось выполнить release_all: {}", e);
    }

    info!("Bongo Rust завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
