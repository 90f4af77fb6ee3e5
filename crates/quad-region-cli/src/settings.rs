use clap::{Args, Parser, Subcommand};
use quad_region_lib::{Bounds, Config, DEFAULT_MAX_DEPTH};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Quad Region - build, inspect and query region quadtree snapshots
pub struct Settings {
    /// Number of levels `locate` descends before giving up
    #[clap(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u8,

    /// Domain covered by the root node, for trees that do not carry their own
    #[clap(flatten)]
    pub domain: DomainArgs,

    #[clap(subcommand)]
    pub command: Command,
}

/// Domain rectangle; defaults to the whole world
#[derive(Args, Debug, Clone)]
pub struct DomainArgs {
    #[clap(id = "domain_north", long = "domain-north", global = true, default_value_t = 90.0, allow_hyphen_values = true)]
    pub north: f64,

    #[clap(id = "domain_south", long = "domain-south", global = true, default_value_t = -90.0, allow_hyphen_values = true)]
    pub south: f64,

    #[clap(id = "domain_west", long = "domain-west", global = true, default_value_t = -180.0, allow_hyphen_values = true)]
    pub west: f64,

    #[clap(id = "domain_east", long = "domain-east", global = true, default_value_t = 180.0, allow_hyphen_values = true)]
    pub east: f64,
}

/// A query rectangle given on the command line
#[derive(Args, Debug, Clone)]
pub struct RectArgs {
    #[clap(long, allow_hyphen_values = true)]
    pub north: f64,

    #[clap(long, allow_hyphen_values = true)]
    pub south: f64,

    #[clap(long, allow_hyphen_values = true)]
    pub west: f64,

    #[clap(long, allow_hyphen_values = true)]
    pub east: f64,
}

/// A geographic point given on the command line
#[derive(Args, Debug, Clone)]
pub struct PointArgs {
    /// Latitude in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[clap(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Grow a random tree and save it
    Generate {
        /// Number of nodes to reach
        #[clap(short, long)]
        nodes: usize,

        /// Leaves at this depth are never split
        #[clap(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
        depth: u8,

        /// Seed for reproducible trees
        #[clap(long)]
        seed: Option<u64>,

        /// Where to write the snapshot
        #[clap(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print a summary of a snapshot
    Info {
        #[clap(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the path of the leaf containing a point
    Locate {
        #[clap(value_name = "FILE")]
        file: PathBuf,

        #[clap(flatten)]
        point: PointArgs,
    },

    /// Split the leaf containing a point and save the result
    Subdivide {
        #[clap(value_name = "FILE")]
        file: PathBuf,

        #[clap(flatten)]
        point: PointArgs,

        /// Where to write the result (defaults to overwriting FILE)
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the leaves intersecting a rectangle
    Query {
        #[clap(value_name = "FILE")]
        file: PathBuf,

        #[clap(flatten)]
        rect: RectArgs,
    },
}

impl Settings {
    /// Index configuration derived from the global options
    pub fn config(&self) -> Config {
        Config {
            bounds: self.domain.bounds(),
            max_depth: self.max_depth,
        }
    }
}

impl DomainArgs {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.north, self.south, self.west, self.east)
    }
}

impl RectArgs {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.north, self.south, self.west, self.east)
    }
}

impl PointArgs {
    /// Point in `geo` order (x = longitude, y = latitude)
    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}
