//! Secondary provider that shells out to the `qpdf` command line tool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::permissions::{EncryptionLevel, PrintTier, ProtectionRequest};
use super::provider::{Attempt, FailureSignal, ProtectionProvider};

/// Exit status qpdf uses for "succeeded with warnings".
const EXIT_WARNINGS: i32 = 3;

/// Runs `qpdf` on scratch files.
///
/// Arguments, passwords included, are passed through an `@file` so they never
/// show up in the process list. Scratch files live in a temporary directory
/// that is removed on every exit path.
#[derive(Debug, Clone)]
pub struct QpdfProvider {
    program: PathBuf,
}

impl Default for QpdfProvider {
    fn default() -> Self {
        Self {
            program: PathBuf::from("qpdf"),
        }
    }
}

impl QpdfProvider {
    /// Use a specific qpdf binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, input: &[u8], args: Vec<String>) -> Attempt {
        let scratch = tempfile::tempdir().map_err(|e| FailureSignal::Other(e.to_string()))?;
        let input_path = scratch.path().join("input.pdf");
        let output_path = scratch.path().join("output.pdf");
        let args_path = scratch.path().join("args");

        fs::write(&input_path, input).map_err(|e| FailureSignal::Other(e.to_string()))?;

        let mut lines = args;
        lines.push(path_arg(&input_path));
        lines.push(path_arg(&output_path));
        fs::write(&args_path, lines.join("\n")).map_err(|e| FailureSignal::Other(e.to_string()))?;

        let output = Command::new(&self.program)
            .arg(format!("@{}", args_path.display()))
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => FailureSignal::Unsupported(format!(
                    "{} is not installed",
                    self.program.display()
                )),
                _ => FailureSignal::Other(format!("cannot run {}: {}", self.program.display(), e)),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(0) | Some(EXIT_WARNINGS) => {
                if !stderr.trim().is_empty() {
                    log::debug!("qpdf: {}", stderr.trim());
                }
                fs::read(&output_path).map_err(|e| FailureSignal::Other(e.to_string()))
            }
            _ => Err(classify_failure(&stderr)),
        }
    }
}

impl ProtectionProvider for QpdfProvider {
    fn name(&self) -> &str {
        "qpdf"
    }

    fn supports_encryption(&self, _level: EncryptionLevel) -> bool {
        true
    }

    fn encrypt(&self, input: &[u8], request: &ProtectionRequest, owner_password: &str) -> Attempt {
        self.run(input, encrypt_args(request, owner_password))
    }

    fn decrypt(&self, input: &[u8], password: &str) -> Attempt {
        self.run(input, vec![format!("--password={}", password), "--decrypt".to_string()])
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn classify_failure(stderr: &str) -> FailureSignal {
    let message = stderr.trim().to_string();
    if message.to_ascii_lowercase().contains("invalid password") {
        FailureSignal::AuthFailure(message)
    } else if message.is_empty() {
        FailureSignal::Other("qpdf failed without a message".to_string())
    } else {
        FailureSignal::Other(message)
    }
}

fn yes_no(allowed: bool) -> &'static str {
    if allowed {
        "y"
    } else {
        "n"
    }
}

/// `--encrypt user owner bits [restrictions] --`
pub(crate) fn encrypt_args(request: &ProtectionRequest, owner_password: &str) -> Vec<String> {
    let level = request.encryption_level;
    let p = &request.permissions;
    let mut args = vec![
        "--encrypt".to_string(),
        request.password.clone(),
        owner_password.to_string(),
        level.key_bits().to_string(),
    ];

    if level == EncryptionLevel::Rc4_40 {
        args.push(format!("--print={}", yes_no(p.printing)));
        args.push(format!("--modify={}", yes_no(p.modifying)));
        args.push(format!("--extract={}", yes_no(p.copying)));
        args.push(format!("--annotate={}", yes_no(p.annotating)));
    } else {
        let print = match p.print_tier() {
            PrintTier::None => "none",
            PrintTier::Restricted => "low",
            PrintTier::Full => "full",
        };
        args.push(format!("--print={}", print));
        args.push(format!("--modify-other={}", yes_no(p.modifying)));
        args.push(format!("--extract={}", yes_no(p.copying)));
        args.push(format!("--annotate={}", yes_no(p.annotating)));
        args.push(format!("--form={}", yes_no(p.filling_forms)));
        args.push(format!("--accessibility={}", yes_no(p.content_extraction)));
        args.push(format!("--assemble={}", yes_no(p.document_assembly)));
    }
    if level == EncryptionLevel::Rc4_128 {
        args.push("--use-aes=n".to_string());
    } else if level == EncryptionLevel::Aes128 {
        args.push("--use-aes=y".to_string());
    }
    if !level.is_aes() {
        args.push("--allow-weak-crypto".to_string());
    }

    args.push("--".to_string());
    args
}
