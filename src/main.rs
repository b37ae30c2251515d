use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use argh::FromArgs;
use tokio::sync::mpsc;
use vedur_core::{AppError, Config, ConfigError};
use vedur_ui::{
    build, location_button_mut, render_document, render_page, Attributes, SearchController,
    MY_LOCATION_BUTTON,
};
use vedur_weather::{ConfiguredLocation, ForecastClient, ForecastOptions, Location};

#[derive(FromArgs)]
/// Print today's hourly temperature and precipitation forecast as an HTML page.
struct Args {
    /// title of a configured location to search for
    #[argh(option, short = 'l')]
    location: Option<String>,

    /// search for the device's current location
    #[argh(switch)]
    here: bool,

    /// path to the configuration file
    #[argh(option)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Args = argh::from_env();

    if let Err(e) = vedur_core::init() {
        eprintln!("{:#}", e);
    }

    if let Err(e) = run(args).await {
        tracing::error!("{:#}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let (config, _) = Config::load_validated(args.config.as_deref())
        .map_err(|e| ConfigError::Load(format!("{:#}", e)))?;

    let locations: Vec<Location> = config
        .locations
        .iter()
        .map(|l| Location::new(&l.title, l.latitude, l.longitude))
        .collect();

    let client = ForecastClient::new(
        &config.weather.api_url,
        ForecastOptions {
            delay: Duration::from_millis(config.weather.fetch_delay_ms),
            timeout: config.weather.request_timeout_secs.map(Duration::from_secs),
        },
    )
    .map_err(|e| AppError::Other(e.into()))?;

    let locator = ConfiguredLocation::new(
        config
            .weather
            .device_location
            .map(|pos| (pos.latitude, pos.longitude)),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut body = build("body", Attributes::new(), vec![]);
    render_page(&mut body, &locations, &tx);

    let target = if args.here {
        Some(MY_LOCATION_BUTTON.to_string())
    } else {
        args.location
    };

    if let Some(title) = target {
        let button = location_button_mut(&mut body, &title)
            .ok_or_else(|| ConfigError::UnknownLocation(title.clone()))?;
        button.dispatch("click");

        let mut controller = SearchController::new(client, locator);
        controller.run_pending(&mut body, &mut rx).await;
        tracing::info!("Search finished: {:?}", controller.phase());
    }

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", render_document(&body).into_string())?;
    Ok(())
}
