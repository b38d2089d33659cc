use clap::Parser;
use tracing_subscriber::EnvFilter;

use kvfs::config::{Cli, Config};
use kvfs::dispatch::KvFs;
use kvfs::fs::Fs;
use kvfs::store::sled_store::SledStore;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli)?;

    tracing::info!(db_path = %config.db_path.display(), mountpoint = %config.mountpoint.display(), "starting kvfsd");

    let store = SledStore::open(&config.db_path)?;
    let core = Fs::bootstrap(Box::new(store), config.uid, config.gid, 0o755)?;
    let fs = KvFs::new(core);

    let options = vec![
        fuser::MountOption::FSName("kvfs".to_string()),
        fuser::MountOption::DefaultPermissions,
    ];
    fuser::mount2(fs, &config.mountpoint, &options)?;
    Ok(())
}
