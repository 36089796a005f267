//! Shell completion scripts for `asset-bridge`.
//!
//! ```bash
//! asset-bridge completions bash > ~/.local/share/bash-completion/completions/asset-bridge
//! asset-bridge completions zsh -o ~/.zsh/completions
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

const BIN_NAME: &str = "asset-bridge";

/// Execute the completions command.
///
/// With `--output` pointing at a directory, the script is written there
/// under the shell's conventional file name.
///
/// # Errors
///
/// Returns an error if file I/O fails.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = convert_shell_type(args.shell);

    match &args.output {
        Some(output) => {
            let path = output_path(output, args.shell);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&path)?;
            generate(shell, &mut cmd, BIN_NAME, &mut file);
            info!(shell = ?args.shell, path = %path.display(), "Wrote completion script");
        }
        None => generate(shell, &mut cmd, BIN_NAME, &mut io::stdout()),
    }
    Ok(())
}

const fn convert_shell_type(shell: ShellType) -> Shell {
    match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
        ShellType::Elvish => Shell::Elvish,
    }
}

/// Conventional completion file name for each shell.
const fn script_name(shell: ShellType) -> &'static str {
    match shell {
        ShellType::Bash => "asset-bridge",
        ShellType::Zsh => "_asset-bridge",
        ShellType::Fish => "asset-bridge.fish",
        ShellType::PowerShell => "asset-bridge.ps1",
        ShellType::Elvish => "asset-bridge.elv",
    }
}

fn output_path(output: &Path, shell: ShellType) -> PathBuf {
    if output.is_dir() {
        output.join(script_name(shell))
    } else {
        output.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut cmd = Cli::command();
        let mut output = Vec::new();
        generate(shell, &mut cmd, BIN_NAME, &mut output);
        String::from_utf8(output).expect("utf8 script")
    }

    #[test]
    fn bash_script_lists_commands_and_flags() {
        let script = script(Shell::Bash);
        for command in ["extract", "resolve", "import", "run", "fields", "whoami"] {
            assert!(script.contains(command), "missing {command}");
        }
        assert!(script.contains("--max-failure-rate"));
        assert!(script.contains("--json"));
    }

    #[test]
    fn fish_script_uses_binary_name() {
        assert!(script(Shell::Fish).contains("complete -c asset-bridge"));
    }

    #[test]
    fn directory_output_uses_conventional_name() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert_eq!(
            output_path(dir.path(), ShellType::Zsh),
            dir.path().join("_asset-bridge")
        );
        let file = dir.path().join("custom.bash");
        assert_eq!(output_path(&file, ShellType::Bash), file);
    }
}
