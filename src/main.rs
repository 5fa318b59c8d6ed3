//! Native entry point: scans a dataset and reports label status per
//! image. Takes one optional argument, the dataset root (defaults to
//! the current directory).

use std::path::{Path, PathBuf};

use yolo_review::{config, DatasetPaths, LabelStore};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    if let Err(e) = run(&root) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let classes = config::load_class_table(&root.join("classes.yaml"));
    let paths = DatasetPaths::discover(root);
    let store = LabelStore::new(paths.labels_dir.clone());

    let images = paths.list_images()?;
    log::info!(
        "{} images under {}, {} classes",
        images.len(),
        paths.images_dir.display(),
        classes.len()
    );

    let mut total = 0usize;
    for name in &images {
        let set = store.load(name, &classes)?;
        total += set.len();
        println!("{name}: {} annotations", set.len());
    }
    println!("{total} annotations across {} images", images.len());
    Ok(())
}
