//! End-to-end Progressive Model Loader scenarios: dependency chains, the
//! pinned-module invariant, out-of-memory handling, and oldest-used-first
//! eviction, exercised through the public crate API.

use amaima_core::error::AmaimaError;
use amaima_core::loader::{ModuleStatus, ProgressiveModelLoader};

#[test]
fn loading_a_dependent_module_transitively_readies_its_dependency() {
    let loader = ProgressiveModelLoader::new(2000, 0, true, 0.3);

    let loaded = loader.load("code-base", false, None).unwrap();

    assert_eq!(loaded.status, ModuleStatus::Ready);
    assert_eq!(loader.status_of("embedding-base"), Some(ModuleStatus::Ready));
    loader.shutdown_preloader();
}

#[test]
fn routing_an_unregistered_module_name_surfaces_as_unknown_module() {
    let loader = ProgressiveModelLoader::new(2000, 0, true, 0.3);

    let err = loader.load("not-a-real-module", false, None).unwrap_err();

    assert!(matches!(err, AmaimaError::UnknownModule(name) if name == "not-a-real-module"));
    loader.shutdown_preloader();
}

#[test]
fn pinned_embedding_module_survives_memory_pressure_that_evicts_others() {
    // Budget sized so embedding(150) + vision(300) + code(220) + reasoning(250)
    // = 920 of 950 pushes pressure past 0.9, forcing eviction before audio-base
    // (180) can be admitted. embedding-base is pinned and must never be
    // evicted, so the oldest-used *evictable* module goes instead.
    let loader = ProgressiveModelLoader::new(950, 0, true, 0.3);
    loader.load("vision-base", false, None).unwrap();
    loader.load("code-base", false, None).unwrap();
    loader.load("reasoning-base", false, None).unwrap();

    let result = loader.load("audio-base", false, None);

    assert!(result.is_ok());
    assert_eq!(loader.status_of("embedding-base"), Some(ModuleStatus::Ready));
    assert_eq!(loader.status_of("vision-base"), None, "oldest-used evictable module should have been reclaimed");
    loader.shutdown_preloader();
}

#[test]
fn a_load_that_cannot_fit_even_after_eviction_reports_out_of_memory() {
    let loader = ProgressiveModelLoader::new(50, 0, true, 0.3);

    let result = loader.load("security-base", false, None);

    assert!(matches!(result, Err(AmaimaError::OutOfMemory { module, .. }) if module == "security-base"));
    loader.shutdown_preloader();
}

#[test]
fn unloading_a_module_with_live_dependents_is_refused_until_they_are_gone() {
    let loader = ProgressiveModelLoader::new(2000, 0, true, 0.3);
    loader.load("vision-base", false, None).unwrap();

    assert!(!loader.unload("embedding-base"));
    assert!(loader.unload("vision-base"));
    assert!(loader.unload("embedding-base"));
    loader.shutdown_preloader();
}

#[test]
fn a_background_predictive_preload_eventually_readies_its_target_module() {
    let loader = ProgressiveModelLoader::new(2000, 0, true, 0.3);

    loader.preload_for_query("please analyze and reason about this logically", None);

    let mut attempts = 0;
    while loader.status_of("reasoning-base") != Some(ModuleStatus::Ready) && attempts < 50 {
        std::thread::sleep(std::time::Duration::from_millis(20));
        attempts += 1;
    }

    assert_eq!(loader.status_of("reasoning-base"), Some(ModuleStatus::Ready));
    loader.shutdown_preloader();
}
