//! Subcommand implementations
//!
//! Snapshots are read and written with tokio's fs helpers; anything that
//! touches the tree after loading goes through the index worker, the same way
//! an interactive front end would drive it.

use crate::settings::{Command, PointArgs, RectArgs, Settings};
use quad_region_lib::generate::grow_random;
use quad_region_lib::worker::spawn_worker;
use quad_region_lib::{Bounds, Config, DataError, QuadPath, SpatialIndex, bounds_of};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: DataError,
    },

    #[error(transparent)]
    Index(#[from] DataError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;

pub async fn run(settings: Settings) -> CliResult<()> {
    let config = settings.config();
    match settings.command {
        Command::Generate {
            nodes,
            depth,
            seed,
            output,
        } => generate(config, nodes, depth, seed, &output).await,
        Command::Info { file } => info(config, &file).await,
        Command::Locate { file, point } => locate(config, &file, &point).await,
        Command::Subdivide {
            file,
            point,
            output,
        } => subdivide(config, &file, &point, output.as_deref()).await,
        Command::Query { file, rect } => query(config, &file, &rect).await,
    }
}

async fn load(config: Config, path: &Path) -> CliResult<SpatialIndex> {
    let data = tokio::fs::read(path).await.map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let index = SpatialIndex::from_bytes(config, &data).map_err(|source| CliError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loaded {} nodes from {}", index.len(), path.display());
    Ok(index)
}

async fn save(data: Vec<u8>, path: &Path) -> CliResult<()> {
    let len = data.len();
    tokio::fs::write(path, data).await.map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} bytes to {}", len, path.display());
    Ok(())
}

fn format_path(path: &QuadPath) -> String {
    if path.is_root() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn format_bounds(b: &Bounds) -> String {
    format!(
        "N {:.6} S {:.6} W {:.6} E {:.6}",
        b.north, b.south, b.west, b.east
    )
}

async fn generate(
    config: Config,
    nodes: usize,
    depth: u8,
    seed: Option<u64>,
    output: &Path,
) -> CliResult<()> {
    profiling::scope!("cli::generate");

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut index = SpatialIndex::new(config);
    let subdivisions = grow_random(&mut index, nodes, depth, &mut rng);
    if index.len() < nodes {
        tracing::warn!(
            "Stopped at {} nodes: every leaf reached depth {}",
            index.len(),
            depth
        );
    }

    save(index.export()?, output).await?;
    println!(
        "Generated {} nodes ({} subdivisions, depth {})",
        index.len(),
        subdivisions,
        index.depth()
    );
    Ok(())
}

async fn info(config: Config, file: &Path) -> CliResult<()> {
    let index = load(config, file).await?;
    let leaves = index.leaf_count();
    println!("Nodes:    {}", index.len());
    println!("Leaves:   {}", leaves);
    println!("Internal: {}", index.len() - leaves);
    println!("Depth:    {}", index.depth());
    let center = index.bounds().center();
    println!("Bounds:   {}", format_bounds(&index.bounds()));
    println!("Center:   lat {:.6} lng {:.6}", center.y(), center.x());
    Ok(())
}

async fn locate(config: Config, file: &Path, point: &PointArgs) -> CliResult<()> {
    let index = load(config, file).await?;
    // A snapshot may carry its own domain, so take it from the loaded index
    let domain = index.bounds();
    let (handle, _task) = spawn_worker(index);

    let path = handle.locate(point.point(), None).await?;
    let bounds = bounds_of(domain, &path);
    println!("{}\t{}", format_path(&path), format_bounds(&bounds));
    Ok(())
}

/// Split the leaf at `point`, writing to `output` or back over `file`
///
/// An explicit output is always written, even when nothing was split.
async fn subdivide(
    config: Config,
    file: &Path,
    point: &PointArgs,
    output: Option<&Path>,
) -> CliResult<()> {
    let index = load(config, file).await?;
    let (handle, _task) = spawn_worker(index);

    match handle.subdivide_at(point.point()).await? {
        Some(path) => println!("Subdivided {}", format_path(&path)),
        None => {
            tracing::warn!(
                "Nothing to subdivide at lat {} lng {} within depth {}",
                point.lat,
                point.lng,
                config.max_depth
            );
            if output.is_none() {
                return Ok(());
            }
        }
    }
    save(handle.export().await?, output.unwrap_or(file)).await
}

async fn query(config: Config, file: &Path, rect: &RectArgs) -> CliResult<()> {
    let index = load(config, file).await?;
    let (handle, _task) = spawn_worker(index);

    let hits = handle.query_range(rect.bounds()).await?;
    for hit in &hits {
        let kind = if hit.implicit { "implicit" } else { "leaf" };
        println!(
            "{}\t{}\t{}",
            format_path(&hit.path),
            kind,
            format_bounds(&hit.bounds)
        );
    }
    tracing::info!("{} quads intersect the query", hits.len());
    Ok(())
}
