//! Entry point for the pmtop CLI. Parses args, resolves a connection
//! profile, and runs one command against the daemon.

use std::env;
use std::io::{self, Write};

use anyhow::Context;
use pmtop::api::{DaemonClient, ProcessLogSource};
use pmtop::app::{server_overview, DaemonView, ProcessView};
use pmtop::logs::{LogChannel, LogTailController};
use pmtop::profiles::{
    load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile,
};
use pmtop::search;
use pmtop::stream::StreamEvent;
use pmtop::types::Action;
use pmtop::util::{human_bytes, uptime_phrase};

enum Command {
    List,
    Servers,
    Daemon,
    Watch(u64),
    Logs(u64),
    Act(Action, u64),
}

struct ParsedArgs {
    command: Command,
    base: Option<String>,
    token: Option<String>,
    profile: Option<String>,
    server: Option<String>,
    find: Option<String>,
    stderr_channel: bool,
    follow: bool,
    save: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--profile NAME|-P NAME] [--token TOKEN|-t TOKEN] [--server NAME|-s NAME] \
[--save] [--dry-run] [COMMAND] [http://HOST:PORT]\n\
Commands:\n  list                     processes managed by the daemon (default)\n  \
servers                  configured servers with version staleness\n  \
daemon                   stream live daemon metrics\n  \
watch ID                 stream live metrics for one process\n  \
logs ID [--stderr] [--follow] [--find TEXT]\n  \
restart|stop|delete|flush ID\n  \
rename ID NEW_NAME"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "pmtop".into());

    let mut base: Option<String> = None;
    let mut token: Option<String> = None;
    let mut profile: Option<String> = None;
    let mut server: Option<String> = None;
    let mut find: Option<String> = None;
    let mut stderr_channel = false;
    let mut follow = false;
    let mut save = false;
    let mut dry_run = false;
    let mut words: Vec<String> = Vec::new();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--token" | "-t" => token = it.next(),
            "--profile" | "-P" => profile = it.next(),
            "--server" | "-s" => server = it.next(),
            "--find" => find = it.next(),
            "--stderr" => stderr_channel = true,
            "--follow" | "-f" => follow = true,
            "--save" => save = true,
            "--dry-run" => dry_run = true,
            _ if arg.starts_with("--token=") || arg.starts_with("--profile=") => {
                if let Some((flag, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        match flag {
                            "--token" => token = Some(v.to_string()),
                            _ => profile = Some(v.to_string()),
                        }
                    }
                }
            }
            _ if arg.starts_with("http://") || arg.starts_with("https://") => {
                if base.is_none() {
                    base = Some(arg);
                } else {
                    return Err(usage(&prog));
                }
            }
            _ if arg.starts_with('-') => return Err(usage(&prog)),
            _ => words.push(arg),
        }
    }

    let parse_id = |w: Option<&String>| -> Result<u64, String> {
        w.and_then(|v| v.parse().ok())
            .ok_or_else(|| usage(&prog))
    };
    let command = match words.first().map(String::as_str) {
        None | Some("list") => Command::List,
        Some("servers") => Command::Servers,
        Some("daemon") => Command::Daemon,
        Some("watch") => Command::Watch(parse_id(words.get(1))?),
        Some("logs") => Command::Logs(parse_id(words.get(1))?),
        Some("restart") => Command::Act(Action::Restart, parse_id(words.get(1))?),
        Some("stop") => Command::Act(Action::Stop, parse_id(words.get(1))?),
        Some("delete") => Command::Act(Action::Delete, parse_id(words.get(1))?),
        Some("flush") => Command::Act(Action::Flush, parse_id(words.get(1))?),
        Some("rename") => {
            let id = parse_id(words.get(1))?;
            let new_name = words.get(2).ok_or_else(|| usage(&prog))?.clone();
            Command::Act(Action::Rename(new_name), id)
        }
        Some(_) => return Err(usage(&prog)),
    };

    Ok(ParsedArgs {
        command,
        base,
        token,
        profile,
        server,
        find,
        stderr_channel,
        follow,
        save,
        dry_run,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        base: parsed.base.clone(),
        token: parsed.token.clone(),
    };
    let resolved = req.resolve(&profiles_file);

    // Determine connection parameters (and maybe mutated profiles to persist)
    let mut profiles_mut = profiles_file.clone();
    let (base, token): (String, Option<String>) = match resolved {
        ResolveProfile::Direct(b, t) => {
            if let Some(name) = parsed.profile.as_ref() {
                let entry = ProfileEntry {
                    base: b.clone(),
                    token: t.clone(),
                };
                match profiles_mut.profiles.get(name) {
                    None => {
                        // New profile: auto-save immediately
                        profiles_mut.profiles.insert(name.clone(), entry);
                        let _ = save_profiles(&profiles_mut);
                    }
                    Some(existing) if *existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: "));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry);
                            let _ = save_profiles(&profiles_mut);
                        }
                    }
                    Some(_) => {}
                }
            }
            (b, t)
        }
        ResolveProfile::Loaded(b, t) => (b, t),
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            eprint!("Enter number (or blank to abort): ");
            let _ = io::stderr().flush();
            let mut line = String::new();
            if io::stdin().read_line(&mut line).is_err() {
                return Ok(());
            }
            let idx: usize = match line.trim().parse() {
                Ok(i) => i,
                Err(_) => return Ok(()),
            };
            match idx
                .checked_sub(1)
                .and_then(|i| names.get(i))
                .and_then(|name| profiles_mut.profiles.get(name))
            {
                Some(entry) => (entry.base.clone(), entry.token.clone()),
                None => return Ok(()),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let base = prompt_string("Enter base URL (http://HOST:PORT): ")?;
            if base.trim().is_empty() {
                return Ok(());
            }
            let tok = prompt_string("Enter API token (or leave blank): ")?;
            let tok = match tok.trim() {
                "" => None,
                t => Some(t.to_string()),
            };
            profiles_mut.profiles.insert(
                name.clone(),
                ProfileEntry {
                    base: base.trim().to_string(),
                    token: tok.clone(),
                },
            );
            let _ = save_profiles(&profiles_mut);
            (base.trim().to_string(), tok)
        }
        ResolveProfile::None => {
            eprintln!("No base URL provided and no profiles to select.");
            return Ok(());
        }
    };

    url::Url::parse(&base).context("invalid base url")?;

    if parsed.dry_run {
        eprintln!("Resolved {base}");
        return Ok(());
    }

    let client = DaemonClient::new(&base, token.as_deref());
    let server = parsed.server.as_deref();

    match parsed.command {
        Command::List => run_list(&client, server).await,
        Command::Servers => run_servers(&client).await,
        Command::Daemon => run_daemon(&client, server).await,
        Command::Watch(id) => run_watch(&client, server, id).await,
        Command::Logs(id) => {
            let channel = if parsed.stderr_channel {
                LogChannel::Stderr
            } else {
                LogChannel::Stdout
            };
            run_logs(&client, server, id, channel, parsed.follow, parsed.find).await
        }
        Command::Act(action, id) => run_action(&client, server, id, action).await,
    }
}

async fn run_list(client: &DaemonClient, server: Option<&str>) -> anyhow::Result<()> {
    let items = client.list_processes(server).await?;
    if items.is_empty() {
        println!("Process table empty");
        return Ok(());
    }
    println!(
        "{:<4} {:<20} {:<8} {:<8} {:>3} {:>8} {:>10} {:>10}",
        "id", "name", "status", "pid", "↺", "cpu", "mem", "uptime"
    );
    for item in items {
        let running = item.status.is_running();
        let pid = match item.pid {
            Some(pid) if running => pid.to_string(),
            _ => "none".into(),
        };
        println!(
            "{:<4} {:<20} {:<8} {:<8} {:>3} {:>8} {:>10} {:>10}",
            item.id,
            item.name,
            item.status.as_str(),
            pid,
            item.restarts,
            if running { &item.cpu } else { "offline" },
            if running { &item.mem } else { "offline" },
            if running { &item.uptime } else { "none" },
        );
    }
    Ok(())
}

async fn run_servers(client: &DaemonClient) -> anyhow::Result<()> {
    let rows = server_overview(client).await?;
    println!(
        "{:<16} {:<10} {:<9} {:<12} {:<8} {:>6} {:<8} {}",
        "server", "version", "staleness", "build", "pid", "count", "status", "uptime"
    );
    for row in rows {
        let daemon = &row.metrics.daemon;
        let uptime = uptime_phrase(&daemon.uptime).unwrap_or_else(|| "none".into());
        println!(
            "{:<16} {:<10} {:<9} {:<12} {:<8} {:>6} {:<8} {}",
            row.name,
            row.metrics.version.pkg,
            row.version.as_str(),
            row.metrics.version.build_date,
            daemon
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "none".into()),
            daemon.process_count,
            if daemon.running { "online" } else { "offline" },
            uptime,
        );
    }
    Ok(())
}

async fn run_daemon(client: &DaemonClient, server: Option<&str>) -> anyhow::Result<()> {
    let mut view = DaemonView::open(client, server);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = view.next_event() => match event {
                Some(StreamEvent::Sample(frame)) => {
                    println!(
                        "{} cpu {:>6.2}%  mem {:>10}  processes {}",
                        chrono::Local::now().format("%H:%M:%S"),
                        frame.raw.cpu_percent.unwrap_or(0.0),
                        human_bytes(frame.raw.memory_usage.unwrap_or(0)),
                        frame.daemon.process_count,
                    );
                }
                Some(StreamEvent::Terminal) | None => break,
            }
        }
    }
    view.close();
    Ok(())
}

async fn run_watch(client: &DaemonClient, server: Option<&str>, id: u64) -> anyhow::Result<()> {
    let mut view = ProcessView::open(client, server, id);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = view.next_event() => match event {
                Some(StreamEvent::Sample(frame)) => {
                    println!(
                        "{} {:<8} cpu {:>6.2}%  rss {:>10}  {}",
                        chrono::Local::now().format("%H:%M:%S"),
                        frame.info.status.as_str(),
                        frame.stats.cpu_percent,
                        human_bytes(frame.stats.memory_usage.rss),
                        frame.info.name,
                    );
                }
                Some(StreamEvent::Terminal) => {
                    println!("process stopped; stream ended");
                    break;
                }
                None => break,
            }
        }
    }
    view.close();
    Ok(())
}

async fn run_logs(
    client: &DaemonClient,
    server: Option<&str>,
    id: u64,
    channel: LogChannel,
    follow: bool,
    find: Option<String>,
) -> anyhow::Result<()> {
    let source = ProcessLogSource::new(client.clone(), server.map(str::to_string), id);
    let mut tail = LogTailController::with_channel(source, channel);
    tail.fetch().await;

    if let Some(query) = find {
        // A search query pauses live tailing; --follow is ignored here
        tail.open_search();
        let snapshot = tail.snapshot();
        let matches = search::filter(&snapshot.lines, &query);
        for line in &matches {
            print_highlighted(line, &query);
        }
        eprintln!("{} matches", matches.len());
        return Ok(());
    }

    print_snapshot(&tail.snapshot());
    if !follow {
        return Ok(());
    }

    let mut updates = tail.watch_snapshot();
    tail.set_live(true);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
        }
    }
    tail.set_live(false);
    Ok(())
}

fn print_snapshot(snapshot: &pmtop::logs::LogSnapshot) {
    eprintln!(
        "--- {} lines ({}){} ---",
        snapshot.lines.len(),
        snapshot.channel.as_str(),
        if snapshot.stale { ", stale" } else { "" },
    );
    for line in &snapshot.lines {
        println!("{line}");
    }
}

fn print_highlighted(line: &str, query: &str) {
    for chunk in search::highlight(line, query) {
        if chunk.matched {
            // inverse video
            print!("\x1b[7m{}\x1b[0m", chunk.text);
        } else {
            print!("{}", chunk.text);
        }
    }
    println!();
}

async fn run_action(
    client: &DaemonClient,
    server: Option<&str>,
    id: u64,
    action: Action,
) -> anyhow::Result<()> {
    // No automatic retry: a failed action is reported and left to the user
    match client.action(server, id, &action).await {
        Ok(()) => {
            println!("{} sent to process {id}", action.method());
            Ok(())
        }
        Err(err) => Err(anyhow::Error::from(err).context("action failed; retry manually")),
    }
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
