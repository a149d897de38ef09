//! Server configuration.
//!
//! Every option can be given as a command line flag or through the
//! environment variable of the same name, e.g. `--port 8080` or `PORT=8080`.
//! Compiler flags are comma separated when read from the environment:
//!
//! ```bash
//! COMPILER=clang++ COMPILER_FLAGS=-O1,-std=c++20 compile-relay
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "compile-relay",
    about = "Compile pasted source code and return the compiler output"
)]
pub struct Config {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Number of compile jobs that may run at the same time
    #[arg(long, env = "NUM_WORKERS", default_value_t = 1)]
    pub num_workers: usize,

    /// HTML page served at `/`
    #[arg(long, env = "INDEX_PATH", default_value = "static/cmd.html")]
    pub index_path: PathBuf,

    /// Parent directory of the per-job working directories
    #[arg(long, env = "WORK_DIR", default_value = "./work")]
    pub work_dir: PathBuf,

    #[arg(long, env = "COMPILER", default_value = "g++")]
    pub compiler: String,

    /// Flags placed before `-o <binary> <source>`
    #[arg(
        long,
        env = "COMPILER_FLAGS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "-O2,-std=c++0x"
    )]
    pub compiler_flags: Vec<String>,

    #[arg(long, env = "COMPILE_TIMEOUT_SECS", default_value_t = 10)]
    pub compile_timeout_secs: u64,

    /// Requests per second allowed on `/compile` per client IP (also the burst
    /// size), 0 disables the limit
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub rate_limit_per_second: u64,

    /// Start even when running as root
    #[arg(long, env = "ALLOW_ROOT", default_value_t = false)]
    pub allow_root: bool,
}

impl Config {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn compiler_settings(&self) -> CompilerSettings {
        CompilerSettings {
            program: self.compiler.clone(),
            flags: self.compiler_flags.clone(),
            work_dir: self.work_dir.clone(),
            timeout: self.compile_timeout(),
        }
    }
}

/// The subset of [`Config`] the compile workers need.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    pub program: String,
    pub flags: Vec<String>,
    pub work_dir: PathBuf,
    pub timeout: Duration,
}
