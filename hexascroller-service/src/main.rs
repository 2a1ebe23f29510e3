//! Hexascroller display service
//!
//! Discovers the three panels, then runs two threads until interrupted:
//!
//! - control: MQTT event loop, applies power/invert/message commands
//! - panels: renders the clock or the current message and pushes bitmaps
//!
//! With `--set-id` or `--get-id` it instead provisions the first panel port
//! and exits. `--text` and `--image` discover the panels, write to them once
//! and exit without connecting to the broker.

use std::fmt::Display;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use hexascroller_core::config::PANEL_COUNT;
use hexascroller_core::traits::{ConnectionError, PanelLink};
use hexascroller_drivers::panel::{discover, SerialPanel};

use hexascroller_service::args::{Args, Provision, Task, USAGE};
use hexascroller_service::bus::{self, MqttPublisher};
use hexascroller_service::config::ServiceConfig;
use hexascroller_service::context::Context;
use hexascroller_service::error::{Result, ServiceError};
use hexascroller_service::hal::{LoopbackUart, SerialUart};
use hexascroller_service::maintenance::{self, MonoBitmap, IMAGE_STEP};
use hexascroller_service::tasks::{Control, PanelLoop};
use hexascroller_service::time::SystemClock;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::embedded()?,
    };
    config.apply_env(|key| std::env::var(key).ok());
    if args.simulate {
        config.panels.simulate = true;
    }
    config.validate()?;

    let job = match args.task {
        None => Job::Serve,
        Some(Task::Provision(provision)) => return provision_panel(&config, provision),
        Some(Task::Text { text, x, y }) => Job::Text { text, x, y },
        Some(Task::Image { path, x }) => {
            // Loaded before discovery so a bad path never touches the panels
            let image = MonoBitmap::open(&path).map_err(|source| ServiceError::Image {
                path: path.clone(),
                source,
            })?;
            Job::Image { image, x }
        }
    };

    if config.panels.simulate {
        log::info!("simulating {PANEL_COUNT} panels");
        // Reverse order so discovery has something to sort
        let ids = (0..PANEL_COUNT as u8).rev();
        let panels = discover(
            ids,
            |id| Ok(SerialPanel::new(LoopbackUart::new(*id))),
            |id, result| report(id, result),
        )?;
        dispatch(config, panels, job)
    } else {
        let uart = config.panels.uart();
        let panels = discover(
            config.panels.ports.iter(),
            |port| {
                SerialUart::open(port, &uart)
                    .map(SerialPanel::new)
                    .map_err(|e| {
                        log::debug!("{port}: {e}");
                        ConnectionError::Unavailable
                    })
            },
            |port, result| report(port, result),
        )?;
        dispatch(config, panels, job)
    }
}

/// What to do once all panels are found
enum Job {
    Serve,
    Text { text: String, x: i32, y: i32 },
    Image { image: MonoBitmap, x: usize },
}

fn report<C: Display>(candidate: &C, result: core::result::Result<u8, ConnectionError>) {
    match result {
        Ok(id) if usize::from(id) < PANEL_COUNT => log::info!("{candidate}: panel {id}"),
        Ok(id) => log::warn!("{candidate}: id {id} out of range, ignored"),
        Err(e) => log::warn!("{candidate}: skipped, {e}"),
    }
}

/// Set or read the logical id of the first panel port
fn provision_panel(config: &ServiceConfig, provision: Provision) -> Result<()> {
    let (name, id) = if config.panels.simulate {
        let mut link = SerialPanel::new(LoopbackUart::new(0));
        ("loopback", maintenance::provision(&mut link, provision)?)
    } else {
        let port = config
            .panels
            .ports
            .first()
            .ok_or_else(|| ServiceError::Usage("no panel port configured".to_string()))?;
        let uart_config = config.panels.uart();
        let uart = SerialUart::open(port, &uart_config).map_err(|source| ServiceError::Open {
            port: port.clone(),
            source,
        })?;
        let mut link = SerialPanel::new(uart);
        (port.as_str(), maintenance::provision(&mut link, provision)?)
    };

    match provision {
        Provision::SetId(_) => log::info!("{name}: id set to {id}"),
        Provision::GetId => println!("{name}: {id}"),
    }
    Ok(())
}

fn dispatch<L>(config: ServiceConfig, mut panels: [L; PANEL_COUNT], job: Job) -> Result<()>
where
    L: PanelLink + Send + 'static,
{
    match job {
        Job::Serve => serve(config, panels),
        Job::Text { text, x, y } => {
            maintenance::show_text(&mut panels, &text, x, y)?;
            log::info!("text sent to {PANEL_COUNT} panels");
            Ok(())
        }
        Job::Image { image, x } => {
            let shown = maintenance::scroll_image(&mut panels, &image, x, IMAGE_STEP)?;
            log::info!("image shown in {shown} steps");
            Ok(())
        }
    }
}

/// Run the control and panel threads until interrupted
fn serve<L>(config: ServiceConfig, panels: [L; PANEL_COUNT]) -> Result<()>
where
    L: PanelLink + Send + 'static,
{
    let ctx = Arc::new(Context::new(config.display));

    let signal_ctx = Arc::clone(&ctx);
    ctrlc::set_handler(move || {
        if signal_ctx.shutdown() {
            log::info!("shutdown requested");
        }
    })?;

    log::info!(
        "connecting to mqtt://{}:{} as {}",
        config.mqtt.host,
        config.mqtt.port,
        config.mqtt.client_id
    );
    let (client, mut connection) = bus::connect(&config.mqtt);
    let publisher = MqttPublisher::new(client);

    let control = Arc::new(Control::new(
        Arc::clone(&ctx),
        publisher.clone(),
        SystemClock,
    ));
    let control_thread = {
        let control = Arc::clone(&control);
        thread::Builder::new()
            .name("control".to_string())
            .spawn(move || control.run(&mut connection))?
    };

    let panel_thread = {
        let ctx = Arc::clone(&ctx);
        thread::Builder::new()
            .name("panels".to_string())
            .spawn(move || PanelLoop::new(ctx, panels, publisher, SystemClock).run())?
    };

    if panel_thread.join().is_err() {
        log::error!("panel loop panicked");
        ctx.shutdown();
    }

    control.farewell();
    if control_thread.join().is_err() {
        log::error!("control loop panicked");
    }

    log::info!("stopped");
    Ok(())
}
