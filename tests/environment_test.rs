use sciforge_hooks::context::GenerationContext;
use sciforge_hooks::environment::{feature_packages, patch_environment, update_environment};
use tempfile::TempDir;

const ENVIRONMENT: &str = include_str!("fixtures/environment.yml");

fn context() -> GenerationContext {
    GenerationContext::new("Ocean Sim", "ocean_sim", "3.10")
}

fn dependencies(content: &str) -> Vec<String> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).unwrap();
    document["dependencies"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_no_features_is_a_no_op() {
    assert_eq!(patch_environment(ENVIRONMENT, &context()), ENVIRONMENT);
}

#[test]
fn test_cuda_packages_follow_header() {
    let mut ctx = context();
    ctx.with_cuda = true;

    let patched = patch_environment(ENVIRONMENT, &ctx);
    assert!(patched.contains("dependencies:\n  - cudatoolkit\n  - cudnn\n  - python=3.10\n"));
}

#[test]
fn test_feature_packages_in_declared_order() {
    let mut ctx = context();
    ctx.include_jupyter = true;
    ctx.include_visualization = true;
    ctx.include_data_analysis = true;

    let patched = patch_environment(ENVIRONMENT, &ctx);
    assert_eq!(
        dependencies(&patched),
        vec!["jupyterlab", "matplotlib-base", "numpy", "pandas", "python=3.10", "pip", "poetry"]
    );
}

#[test]
fn test_no_duplicates_after_patching() {
    let content = "name: demo\ndependencies:\n  - numpy>=1.24\n  - jupyterlab\n";
    let mut ctx = context();
    ctx.include_jupyter = true;
    ctx.include_data_analysis = true;

    let patched = patch_environment(content, &ctx);
    assert_eq!(dependencies(&patched), vec!["pandas", "numpy>=1.24", "jupyterlab"]);

    // A second run adds nothing.
    assert_eq!(patch_environment(&patched, &ctx), patched);
}

#[test]
fn test_literal_fallback_when_yaml_is_invalid() {
    // Unclosed flow sequence.
    let content = "dependencies:\n  - numpy\n  - pip\nchannels: [conda-forge\n";
    let mut ctx = context();
    ctx.include_data_analysis = true;

    let patched = patch_environment(content, &ctx);
    assert_eq!(patched.matches("numpy").count(), 1);
    assert!(patched.contains("  - pandas\n"));
}

#[test]
fn test_missing_header_is_a_no_op() {
    let content = "name: demo\nchannels:\n  - conda-forge\n";
    let mut ctx = context();
    ctx.include_jupyter = true;
    assert_eq!(patch_environment(content, &ctx), content);
}

#[test]
fn test_feature_packages() {
    let mut ctx = context();
    ctx.include_visualization = true;
    ctx.with_cuda = true;
    assert_eq!(feature_packages(&ctx), vec!["cudatoolkit", "cudnn", "matplotlib-base"]);
}

#[test]
fn test_update_environment_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("environment.yml");
    std::fs::write(&path, ENVIRONMENT).unwrap();

    let mut ctx = context();
    ctx.include_jupyter = true;
    update_environment(temp_dir.path(), &ctx).unwrap();

    let updated = std::fs::read_to_string(&path).unwrap();
    assert!(dependencies(&updated).contains(&"jupyterlab".to_string()));
    assert!(updated.starts_with("name: ocean_sim\n"));
}
