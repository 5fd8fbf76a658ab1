// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// lingdist - Distance matrices between inferred and reference phylogenies
pub struct Args {
    /// path to the dataset table (.csv)
    #[argh(option)]
    pub data: Option<String>,

    /// results directory root
    #[argh(option)]
    pub results_dir: Option<String>,

    /// path to the external quartet-distance executable
    #[argh(option)]
    pub qdist_exe: Option<String>,

    /// path to the external tree-inference executable
    #[argh(option)]
    pub raxml_exe: Option<String>,

    /// timeout for one quartet-distance invocation in seconds (default: 300)
    #[argh(option)]
    pub qdist_timeout: Option<u64>,

    /// comma-separated metrics to compute (default: rf,gq)
    #[argh(option)]
    pub metrics: Option<String>,

    /// comma-separated reference tree names in matrix order
    /// (default: glottolog,bin,catg_bin,catg_multi,consensus)
    #[argh(option)]
    pub ref_trees: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// include only datasets whose ds_id matches regex pattern
    #[argh(option)]
    pub include_datasets: Option<String>,

    /// exclude datasets whose ds_id matches regex pattern
    #[argh(option)]
    pub exclude_datasets: Option<String>,

    /// restrict to datasets with this ling_type
    #[argh(option)]
    pub ling_type: Option<String>,

    /// run the external inference and consensus stage before computing distances
    #[argh(switch)]
    pub run_inference: bool,

    /// recompute distance matrices even when cached files exist
    #[argh(switch)]
    pub force_recompute: bool,

    /// use the partitioning-variant distances subtree
    #[argh(switch)]
    pub partitioning: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// report output file (default: <results-dir>/distance_report.csv)
    #[argh(option)]
    pub report: Option<String>,

    /// skip report generation
    #[argh(switch)]
    pub no_report: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
