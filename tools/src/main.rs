//! desk-runner: headless runner for the lead desk.
//!
//! Usage:
//!   desk-runner --db desk.db --seed 42 --demo-leads 120
//!   desk-runner --db desk.db --as 4 --ipc-mode

use anyhow::{Context, Result};
use lead_desk_core::{
    clock::DeskClock,
    command::{execute, DeskCommand, DeskReply},
    config::DeskConfig,
    demo::{seed_demo, DemoPlan},
    desk::LeadDesk,
    identity::Caller,
    role::{Action, Role},
    store::{DeskStore, RefEntity},
    visibility::{Scope, SqlPredicate},
};
use std::env;
use std::io::{self, BufRead, Write};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo_leads = parse_arg(&args, "--demo-leads", DemoPlan::default().leads);
    let acting_as = args
        .windows(2)
        .find(|w| w[0] == "--as")
        .and_then(|w| w[1].parse::<i64>().ok());
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Lead Desk: desk-runner");
        println!("  seed:      {seed}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = DeskConfig::load(data_dir)?;
    let store = if db == ":memory:" {
        DeskStore::in_memory()?
    } else {
        DeskStore::open(db)?
    };
    store.migrate()?;
    let mut desk = LeadDesk::new(store, config, DeskClock::System);

    let seeded_admin = if desk.store.list_users()?.is_empty() {
        let plan = DemoPlan {
            leads: demo_leads,
            ..DemoPlan::default()
        };
        let summary = seed_demo(&desk, seed, plan)?;
        if !ipc_mode {
            println!(
                "  seeded demo office: {} users, {} teams, {} leads",
                summary.users, summary.teams, summary.leads
            );
        }
        Some(summary.admin_id)
    } else {
        None
    };

    let caller_id = acting_as
        .or(seeded_admin)
        .map(Ok)
        .unwrap_or_else(|| first_admin(&desk))?;
    let mut caller = desk
        .caller(caller_id)
        .with_context(|| format!("cannot act as user {caller_id}"))?;

    if ipc_mode {
        run_ipc_loop(&mut desk, &mut caller)?;
    } else {
        print_summary(&desk, &caller)?;
    }

    Ok(())
}

fn first_admin(desk: &LeadDesk) -> Result<i64> {
    desk.store
        .list_users()?
        .into_iter()
        .find(|u| u.role == Role::Admin)
        .map(|u| u.id)
        .context("no admin user in the database; pass --as <user id>")
}

/// One JSON `DeskCommand` per stdin line, one JSON `DeskReply` per stdout
/// line. Errors become error replies; the loop ends at EOF or `{"cmd":"quit"}`.
fn run_ipc_loop(desk: &mut LeadDesk, caller: &mut Caller) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }
        if is_quit(line) {
            break;
        }

        let reply = match serde_json::from_str::<DeskCommand>(line) {
            Ok(cmd) => execute(desk, caller, cmd).unwrap_or_else(|e| {
                log::warn!("ipc: command failed: {e}");
                DeskReply::error(&e)
            }),
            Err(e) => DeskReply::Error {
                kind:    "parse".into(),
                message: e.to_string(),
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn is_quit(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v["cmd"] == "quit")
        .unwrap_or(false)
}

fn print_summary(desk: &LeadDesk, caller: &Caller) -> Result<()> {
    let counts = desk.store.status_counts(&SqlPredicate::always())?;
    let rates = &desk.config.commission;

    println!("=== DESK SUMMARY ===");
    println!("  as of:            {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  acting as:        {} ({})", caller.name, caller.role);
    println!(
        "  leads in scope:   {}",
        desk.store.count_leads(&Scope::for_caller(caller).predicate())?
    );
    println!("  users:            {}", desk.store.list_users()?.len());
    println!("  teams:            {}", desk.store.list_teams()?.len());
    for entity in [RefEntity::Insurance, RefEntity::Product, RefEntity::CenterCode] {
        println!(
            "  {:<17} {}",
            format!("{entity}:"),
            desk.store.list_references(entity)?.len()
        );
    }
    println!();
    println!("=== LEADS BY STATUS ===");
    println!("  total:            {}", counts.total);
    println!("  new:              {}", counts.new);
    println!("  billable:         {}", counts.billable);
    println!("  paid:             {}", counts.paid);
    println!("  returned:         {}", counts.returned);
    println!("  bad lead:         {}", counts.bad_lead);
    println!("  deducted return:  {}", counts.deducted_return);
    println!();
    println!("=== DASHBOARD ({}) ===", caller.role);
    for card in desk.dashboard(caller)?.cards() {
        println!("  {:<17} {}  ({})", format!("{}:", card.label), card.value, card.description);
    }

    if caller.role.can(Action::ViewCommissions) {
        println!();
        println!("=== COMMISSIONS ({}) ===", rates.currency);
        for row in desk.commission_table(caller)? {
            println!(
                "  {:<12} {:<8} total {:>4}  billed {:>4}  commission {:>8}",
                row.name, row.role, row.total, row.billed, row.commission
            );
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
