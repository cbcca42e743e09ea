//! # Shell Completion Module
//!
//! This module provides shell completion functionality for Replay, including:
//! - Generation of completion scripts for various shells
//! - Custom completion for track and artist names from the current session
//! - Integration with clap's completion system
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! replay completion bash > ~/.local/share/bash-completion/completions/replay
//!
//! # Enhanced fish completions with track names
//! replay completion-enhanced fish > ~/.config/fish/completions/replay.fish
//! ```

use crate::cli::Shell;
use crate::config;
use crate::session::Session;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Enhanced fish completion script with track and artist completion
#[must_use]
pub fn enhanced_fish_completion() -> &'static str {
    r#"# Enhanced Replay completion script for Fish shell with track and artist completion
# Install with: replay completion-enhanced fish > ~/.config/fish/completions/replay.fish

function __replay_complete_tracks
    if command -sq replay
        replay complete-tracks 2>/dev/null
    end
end

function __replay_complete_artists
    if command -sq replay
        replay complete-artists 2>/dev/null
    end
end

complete -c replay -e

# Global options
complete -c replay -s h -l help -d 'Print help information'
complete -c replay -s V -l version -d 'Print version information'
complete -c replay -l data-dir -r -a '(__fish_complete_directories)' -d 'Directory holding the session'

# Main commands
complete -c replay -f -n '__fish_is_first_token' -a 'load' -d 'Load streaming-history export files'
complete -c replay -f -n '__fish_is_first_token' -a 'demo' -d 'Load the built-in demonstration dataset'
complete -c replay -f -n '__fish_is_first_token' -a 'reset' -d 'Discard the current session'
complete -c replay -f -n '__fish_is_first_token' -a 'overview' -d 'Totals and top rankings'
complete -c replay -f -n '__fish_is_first_token' -a 'hours' -d 'Minutes per hour of the day'
complete -c replay -f -n '__fish_is_first_token' -a 'heatmap' -d 'Weekday by hour heatmap'
complete -c replay -f -n '__fish_is_first_token' -a 'years' -d 'Compare the most recent years'
complete -c replay -f -n '__fish_is_first_token' -a 'evolution' -d 'Month-by-month trends'
complete -c replay -f -n '__fish_is_first_token' -a 'top' -d 'Rank a column by minutes listened'
complete -c replay -f -n '__fish_is_first_token' -a 'artist' -d 'Show an artist and their tracks'
complete -c replay -f -n '__fish_is_first_token' -a 'flow' -d 'Tracks played before and after a track'
complete -c replay -f -n '__fish_is_first_token' -a 'recommend' -d 'Listening-pattern recommendations'
complete -c replay -f -n '__fish_is_first_token' -a 'facts' -d 'Fun facts about listening time'
complete -c replay -f -n '__fish_is_first_token' -a 'export' -d 'Write the session as an export file'
complete -c replay -f -n '__fish_is_first_token' -a 'completion' -d 'Generate shell completions'
complete -c replay -f -n '__fish_is_first_token' -a 'completion-enhanced' -d 'Generate enhanced shell completions'

# Arguments
complete -c replay -n '__fish_seen_subcommand_from load' -l strict -d 'Check every record'
complete -c replay -f -n '__fish_seen_subcommand_from top' -a 'artist track album platform'
complete -c replay -f -n '__fish_seen_subcommand_from top' -l period -r -a 'dawn morning afternoon night'
complete -c replay -f -n '__fish_seen_subcommand_from top' -l weekday -r -a 'monday tuesday wednesday thursday friday saturday sunday'
complete -c replay -f -n '__fish_seen_subcommand_from artist' -a '(__replay_complete_artists)' -d 'Artist'
complete -c replay -f -n '__fish_seen_subcommand_from flow' -a '(__replay_complete_tracks)' -d 'Track'
complete -c replay -f -n '__fish_seen_subcommand_from facts' -l city -r -d 'Your city'
complete -c replay -f -n '__fish_seen_subcommand_from facts' -l facts-only -d 'Skip travel comparisons'
complete -c replay -f -n '__fish_seen_subcommand_from completion completion-enhanced' -a 'bash zsh fish power-shell elvish'
"#
}

/// Enhanced bash completion script with track and artist completion
#[must_use]
pub fn enhanced_bash_completion() -> &'static str {
    r#"#!/bin/bash
# Enhanced Replay completion script with track and artist completion
# Install with: replay completion-enhanced bash > ~/.local/share/bash-completion/completions/replay

_replay() {
    local cur prev words cword
    _init_completion || return

    case "${prev}" in
        flow)
            mapfile -t COMPREPLY < <(replay complete-tracks 2>/dev/null | grep -i "^${cur}")
            return 0
            ;;
        artist)
            mapfile -t COMPREPLY < <(replay complete-artists 2>/dev/null | grep -i "^${cur}")
            return 0
            ;;
        top)
            COMPREPLY=($(compgen -W "artist track album platform" -- "${cur}"))
            return 0
            ;;
        --period)
            COMPREPLY=($(compgen -W "dawn morning afternoon night" -- "${cur}"))
            return 0
            ;;
        --weekday)
            COMPREPLY=($(compgen -W "monday tuesday wednesday thursday friday saturday sunday" -- "${cur}"))
            return 0
            ;;
        completion|completion-enhanced)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${cur}"))
            return 0
            ;;
        load|export|--data-dir)
            _filedir
            return 0
            ;;
    esac

    local subcommands="load demo reset overview hours heatmap years evolution top artist flow recommend facts export completion completion-enhanced help"

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=($(compgen -W "$subcommands --data-dir --help --version" -- "${cur}"))
    else
        case "${words[1]}" in
            load)
                _filedir
                COMPREPLY+=($(compgen -W "--strict" -- "${cur}"))
                ;;
            top)
                COMPREPLY=($(compgen -W "--limit --period --weekday --help" -- "${cur}"))
                ;;
            facts)
                COMPREPLY=($(compgen -W "--city --count --facts-only --seed --help" -- "${cur}"))
                ;;
            *)
                COMPREPLY=($(compgen -W "--help" -- "${cur}"))
                ;;
        esac
    fi
} &&
complete -F _replay replay

# ex: filetype=sh
"#
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Which names to offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Tracks,
    Artists,
}

/// Distinct track or artist names of the stored session, sorted.
///
/// Any problem reading the session yields no completions rather than an
/// error, so a broken session never breaks the shell.
#[must_use]
pub fn name_completions(data_dir: &Path, kind: NameKind) -> Vec<String> {
    let Ok(session) = Session::open(&config::session_dir(data_dir)) else {
        return Vec::new();
    };

    let table = session.table();
    let names = match kind {
        NameKind::Tracks => table.distinct_tracks(),
        NameKind::Artists => table.distinct_artists(),
    };

    let mut completions: Vec<String> = names.into_iter().map(str::to_string).collect();
    completions.sort();
    completions
}

/// Print completions one per line.
///
/// # Errors
///
/// Only when the data directory cannot be resolved.
pub fn print_name_completions(data_dir: Option<&Path>, kind: NameKind) -> Result<()> {
    let data_dir = config::resolve_data_dir(data_dir)?;
    for name in name_completions(&data_dir, kind) {
        println!("{name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_batch;
    use tempfile::TempDir;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(shell_to_completion_shell(Shell::Bash), CompletionShell::Bash);
        assert_eq!(shell_to_completion_shell(Shell::Zsh), CompletionShell::Zsh);
    }

    #[test]
    fn test_completions_without_session() {
        let temp = TempDir::new().unwrap();
        assert!(name_completions(temp.path(), NameKind::Tracks).is_empty());
    }

    #[test]
    fn test_completions_from_session() {
        let temp = TempDir::new().unwrap();
        Session::replace(&config::session_dir(temp.path()), vec![demo_batch().unwrap()]).unwrap();

        let artists = name_completions(temp.path(), NameKind::Artists);
        assert!(artists.contains(&"Famous Artist".to_string()));
        let mut sorted = artists.clone();
        sorted.sort();
        assert_eq!(artists, sorted);

        let tracks = name_completions(temp.path(), NameKind::Tracks);
        assert!(tracks.contains(&"Popular Song".to_string()));
    }

    #[test]
    fn test_enhanced_scripts_call_hidden_commands() {
        assert!(enhanced_bash_completion().contains("replay complete-tracks"));
        assert!(enhanced_fish_completion().contains("replay complete-artists"));
    }
}
