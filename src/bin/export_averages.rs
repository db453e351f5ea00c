use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use station_averages_service::dataset::{Dataset, DatasetSource};
use station_averages_service::selection::{Selection, SelectionQuery};
use station_averages_service::services::export_service;
use station_averages_service::services::AveragesService;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "export-averages")]
#[command(about = "Export per-scenario station averages as CSV files", long_about = None)]
struct Cli {
    /// Measurement table (ID_SIGA, Escenario, Fecha, variables...)
    #[arg(long, env = "MEASUREMENTS_PATH")]
    measurements: PathBuf,

    /// Station metadata workbook (ID_SIGA, Cuenca, Subcuenca); enables basin filtering
    #[arg(long, env = "STATION_METADATA_PATH")]
    metadata: Option<PathBuf>,

    /// Sheet of the metadata workbook (default: first sheet)
    #[arg(long, env = "STATION_METADATA_SHEET")]
    sheet: Option<String>,

    /// Basin to pick stations from
    #[arg(long)]
    basin: Option<String>,

    /// Station id (default: first station)
    #[arg(long)]
    station: Option<String>,

    /// Averaging mode: 'Total' or 'Por año' (also 'por_ano')
    #[arg(long, default_value = "Total")]
    mode: String,

    /// Variable for 'Por año' mode (default: first variable)
    #[arg(long)]
    variable: Option<String>,

    /// Directory to write CSV files into
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Export every station (of the basin, if given) instead of one
    #[arg(long)]
    all_stations: bool,

    /// Print variables, basins and stations, then exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let source = DatasetSource {
        measurements_path: cli.measurements.clone(),
        metadata_path: cli.metadata.clone(),
        metadata_sheet: cli.sheet.clone(),
    };

    let load_start = Instant::now();
    let dataset = Arc::new(Dataset::load(&source)?);
    info!("Dataset loaded in {:?}", load_start.elapsed());

    let service = AveragesService::new(dataset.clone());

    if cli.list {
        print_listing(&service, cli.basin.as_deref());
        return Ok(());
    }

    fs::create_dir_all(&cli.output_dir)?;

    let query = SelectionQuery {
        basin: cli.basin.clone(),
        station: cli.station.clone(),
        mode: Some(cli.mode.clone()),
        variable: cli.variable.clone(),
    };

    if cli.all_stations {
        export_all(&service, &query, &cli.output_dir)
    } else {
        match service.export(&query)? {
            Some(file) => {
                let path = write_file(&cli.output_dir, &file.file_name, &file.content)?;
                println!("✓ Wrote {}", path.display());
            }
            None => println!("No station available for basin {:?}", cli.basin),
        }
        Ok(())
    }
}

fn print_listing(service: &AveragesService, basin: Option<&str>) {
    let schema = service.schema();
    println!("Variables ({}):", schema.variables.len());
    for variable in &schema.variables {
        println!("  {variable}");
    }

    if let Some(basins) = service.basins() {
        println!("\nBasins ({}):", basins.len());
        for basin in &basins {
            println!("  {basin}");
        }
    }

    let stations = service.stations(basin);
    println!("\nStations ({}):", stations.len());
    for station in &stations {
        println!("  {}", station.label);
    }
}

fn export_all(
    service: &AveragesService,
    query: &SelectionQuery,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve once to validate mode/variable/basin and learn the effective mode
    let Some(template) = query.resolve(service.dataset())? else {
        println!("No station available for basin {:?}", query.basin);
        return Ok(());
    };

    let stations = service.stations(query.basin.as_deref());
    let pb = ProgressBar::new(stations.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut written = 0usize;
    let mut empty = 0usize;
    for station in stations {
        pb.set_message(station.id.clone());

        let selection = Selection {
            basin: template.basin.clone(),
            station: station.id,
            mode: template.mode.clone(),
        };
        let result = service.aggregate(&selection)?;
        if result.is_empty() {
            empty += 1;
        }

        let file = export_service::export(&selection.station, &selection.mode, &result)?;
        write_file(output_dir, &file.file_name, &file.content)?;
        written += 1;
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "✓ Wrote {written} files ({empty} stations without records)"
    ));
    Ok(())
}

fn write_file(
    output_dir: &Path,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, std::io::Error> {
    let path = output_dir.join(file_name);
    fs::write(&path, content)?;
    info!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_averages_service::selection::AggregationMode;

    #[test]
    fn test_write_file_stays_in_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file_name = export_service::export_file_name("../../A1", &AggregationMode::Total);

        let path = write_file(dir.path(), &file_name, "Escenario,Temp\n").unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Escenario,Temp\n");
    }
}
