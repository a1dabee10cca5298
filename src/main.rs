use geoplay::api::{CsvFormatter, TextFormatter};
use geoplay::{
    CalibrationParameters, ConfigurationManager, GameConfig, GeoPoint, GeoProjector, PixelPoint, PositioningSession,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Frame period of the simulated render loop (milliseconds)
const FRAME_MS: f64 = 16.0;

/// Map misalignment the demo injects; calibration should discover it
const SIMULATED_MAP_ERROR: CalibrationParameters = CalibrationParameters {
    scale_x: 1.02,
    scale_y: 1.02,
    offset_x: 9.0,
    offset_y: -6.0,
    rotation_degrees: 1.5,
};

struct Options {
    config_path: Option<String>,
    output: Output,
}

enum Output {
    Text,
    Json,
    Csv,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        config_path: None,
        output: Output::Text,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config requires a file path")?;
                options.config_path = Some(path.clone());
            }
            "--json" => options.output = Output::Json,
            "--csv" => options.output = Output::Csv,
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(options)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!(
                "Usage: {} [--config <file.json>] [--json | --csv]",
                args.first().map_or("geoplay", |s| s.as_str())
            );
            return Err("Invalid arguments".into());
        }
    };

    let mut config = match &options.config_path {
        Some(path) => ConfigurationManager::from_file(path)?.config().clone(),
        None => GameConfig::default(),
    };
    config.monitor.auto_calibrate = true;

    let default_filter = if config.debug_logging { "geoplay=debug" } else { "geoplay=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let mut session = PositioningSession::new(config)?;
    let waypoints = [
        PixelPoint::new(520.0, 220.0),
        PixelPoint::new(300.0, 180.0),
        PixelPoint::new(260.0, 420.0),
        PixelPoint::new(560.0, 400.0),
        PixelPoint::new(400.0, 300.0),
    ];

    let mut now_ms = 0.0;
    for waypoint in waypoints {
        if let Err(e) = session.handle_click(waypoint, now_ms) {
            warn!("Click at {} ignored: {}", waypoint, e);
            continue;
        }

        while session.tracker().is_moving() {
            now_ms += FRAME_MS;
            let sprite = session.update(now_ms)?;

            if session.should_sample(now_ms as u64) {
                // Where the map underneath the sprite really is
                let expected = GeoProjector::to_geo(&sprite, session.origin(), &SIMULATED_MAP_ERROR)?;
                session.run_position_test(expected, now_ms as u64)?;
            }
        }
        info!("Reached waypoint {} at {:.0} ms", waypoint, now_ms);
    }

    if let Err(e) = session.place_flag(GeoPoint::default()) {
        warn!("Flag placement failed: {}", e);
    }

    let report = session.report();
    match options.output {
        Output::Text => println!("{}", TextFormatter::new().with_calibration().format_text(&report)),
        Output::Json => println!("{}", report.to_json()?),
        Output::Csv => println!("{}", CsvFormatter::new().format_csv(session.monitor().records())),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(&args(&["geoplay", "--config", "game.json", "--json"])).unwrap();
        assert_eq!(options.config_path.as_deref(), Some("game.json"));
        assert!(matches!(options.output, Output::Json));

        assert!(parse_args(&args(&["geoplay", "--config"])).is_err());
        assert!(parse_args(&args(&["geoplay", "--bogus"])).is_err());
    }
}
