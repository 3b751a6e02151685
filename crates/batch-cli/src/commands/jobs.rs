use std::sync::Arc;

use batch_adapters::{register_demo_jobs, DemoResources, JobSettings};
use batch_core::{InMemoryExecutionRepository, JobLauncher};

use super::CliError;

pub fn execute() -> Result<(), CliError> {
    let mut launcher = JobLauncher::new(Arc::new(InMemoryExecutionRepository::new()));
    register_demo_jobs(&mut launcher, &DemoResources::new(), &JobSettings::default())?;
    let mut names = launcher.registry().names();
    names.sort_unstable();
    for name in names {
        let steps = launcher.registry()
                            .get(name)
                            .map(|job| job.step_names().map(str::to_string).collect::<Vec<_>>().join(", "))
                            .unwrap_or_default();
        println!("{name:<24} steps: {steps}");
    }
    Ok(())
}
