pub mod cli;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "tableprep")]
    #[command(about = "Profile, clean-plan and normalize heterogeneous tabular files")]
    pub struct CliConfig {
        #[arg(help = "Files to process")]
        pub inputs: Vec<String>,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, default_value = "4")]
        pub concurrent_files: usize,

        #[arg(long, default_value = "10", help = "Records kept in each profile sample")]
        pub sample_rows: usize,

        #[arg(long, help = "Apply the generated plan and export a cleaned CSV")]
        pub apply: bool,

        #[arg(long, help = "Log process resource usage")]
        pub monitor: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn concurrent_files(&self) -> usize {
            self.concurrent_files
        }

        fn sample_rows(&self) -> usize {
            self.sample_rows
        }

        fn apply_plan(&self) -> bool {
            self.apply
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_non_empty_list("inputs", &self.inputs)?;
            for input in &self.inputs {
                validation::validate_path("inputs", input)?;
            }
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_positive_number("concurrent_files", self.concurrent_files, 1)?;
            validation::validate_range("sample_rows", self.sample_rows, 1, 1000)?;
            Ok(())
        }
    }
}
