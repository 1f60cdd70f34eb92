use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use enigrab_aws::Ec2EniProvider;
use enigrab_aws::metadata;
use enigrab_core::eni::EniState;
use enigrab_core::orchestrator::{Orchestrator, Outcome};
use enigrab_core::provider::EniApi;
use enigrab_core::waiter::RetryPolicy;

#[derive(Parser)]
#[command(name = "enigrab")]
#[command(about = "Attach, detach, and grab EC2 network interfaces", long_about = None)]
struct Cli {
    /// AWS region (defaults to the environment or instance metadata)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of a network interface
    #[command(alias = "st")]
    Status {
        /// Network interface id (eni-xxx)
        eni_id: String,
    },
    /// List network interfaces in the region
    #[command(alias = "ls")]
    List,
    /// Attach a network interface to an instance
    Attach {
        /// Network interface id (eni-xxx)
        eni_id: String,

        /// Target instance id (defaults to this machine)
        #[arg(short = 'I', long)]
        instance_id: Option<String>,

        /// Device index for the attachment
        #[arg(short, long, default_value_t = 1)]
        device_index: i32,

        #[command(flatten)]
        wait: WaitArgs,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Detach a network interface from its current instance
    Detach {
        /// Network interface id (eni-xxx)
        eni_id: String,

        #[command(flatten)]
        wait: WaitArgs,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Move a network interface to an instance, detaching it from its
    /// current holder first if necessary
    Grab {
        /// Network interface id (eni-xxx)
        eni_id: String,

        /// Target instance id (defaults to this machine)
        #[arg(short = 'I', long)]
        instance_id: Option<String>,

        /// Device index for the attachment
        #[arg(short, long, default_value_t = 1)]
        device_index: i32,

        #[command(flatten)]
        wait: WaitArgs,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct WaitArgs {
    /// Maximum number of status polls before giving up
    #[arg(short = 'n', long, default_value_t = 10)]
    max_attempts: u32,

    /// Seconds between status polls
    #[arg(short, long, default_value_t = 2)]
    interval: u64,

    /// Overall deadline in seconds for each wait
    #[arg(long)]
    timeout: Option<u64>,
}

impl WaitArgs {
    fn policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(self.max_attempts, Duration::from_secs(self.interval));
        if let Some(timeout) = self.timeout {
            policy = policy.with_timeout(Duration::from_secs(timeout));
        }
        policy
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let region = cli.region.clone();

    let result = match cli.command {
        Commands::Status { eni_id } => run_status(region.as_deref(), &eni_id).await,
        Commands::List => run_list(region.as_deref()).await,
        Commands::Attach {
            eni_id,
            instance_id,
            device_index,
            wait,
            yes,
        } => {
            run_attach(
                region.as_deref(),
                &eni_id,
                instance_id,
                device_index,
                &wait,
                yes,
            )
            .await
        }
        Commands::Detach { eni_id, wait, yes } => {
            run_detach(region.as_deref(), &eni_id, &wait, yes).await
        }
        Commands::Grab {
            eni_id,
            instance_id,
            device_index,
            wait,
            yes,
        } => {
            run_grab(
                region.as_deref(),
                &eni_id,
                instance_id,
                device_index,
                &wait,
                yes,
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_status(region: Option<&str>, eni_id: &str) -> Result<(), String> {
    let provider = Ec2EniProvider::new(region).await;
    let eni = provider
        .describe_eni(eni_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("network interface {} not found", eni_id))?;

    print_eni_table(&[eni]);
    Ok(())
}

async fn run_list(region: Option<&str>) -> Result<(), String> {
    let provider = Ec2EniProvider::new(region).await;
    let enis = provider.list_enis().await.map_err(|e| e.to_string())?;

    if enis.is_empty() {
        println!("{}", "No network interfaces found.".yellow());
        return Ok(());
    }

    print_eni_table(&enis);
    Ok(())
}

async fn run_attach(
    region: Option<&str>,
    eni_id: &str,
    instance_id: Option<String>,
    device_index: i32,
    wait: &WaitArgs,
    yes: bool,
) -> Result<(), String> {
    if !yes && !confirm(&format!("Attach {}. Are you sure?", eni_id))? {
        println!("{}", "Attachment cancelled.".yellow());
        return Ok(());
    }

    let provider = Ec2EniProvider::new(region).await;
    let instance_id = resolve_instance(&provider, instance_id).await?;

    let outcome = Orchestrator::new(&provider)
        .attach(eni_id, &instance_id, device_index, &wait.policy())
        .await
        .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::NoOp(_) => println!(
            "{}",
            format!("{} already attached to instance {}", eni_id, instance_id).yellow()
        ),
        Outcome::Completed(_) => println!(
            "{}",
            format!("{} attached to instance {}", eni_id, instance_id)
                .green()
                .bold()
        ),
    }
    Ok(())
}

async fn run_detach(
    region: Option<&str>,
    eni_id: &str,
    wait: &WaitArgs,
    yes: bool,
) -> Result<(), String> {
    if !yes && !confirm(&format!("Detach {}. Are you sure?", eni_id))? {
        println!("{}", "Detachment cancelled.".yellow());
        return Ok(());
    }

    let provider = Ec2EniProvider::new(region).await;
    let outcome = Orchestrator::new(&provider)
        .detach(eni_id, &wait.policy())
        .await
        .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::NoOp(_) => println!("{}", format!("{} already detached", eni_id).yellow()),
        Outcome::Completed(_) => {
            println!("{}", format!("{} detached", eni_id).green().bold())
        }
    }
    Ok(())
}

async fn run_grab(
    region: Option<&str>,
    eni_id: &str,
    instance_id: Option<String>,
    device_index: i32,
    wait: &WaitArgs,
    yes: bool,
) -> Result<(), String> {
    if !yes && !confirm(&format!("Grab {}. Are you sure?", eni_id))? {
        println!("{}", "Grab cancelled.".yellow());
        return Ok(());
    }

    let provider = Ec2EniProvider::new(region).await;
    let instance_id = resolve_instance(&provider, instance_id).await?;

    let outcome = Orchestrator::new(&provider)
        .grab(eni_id, &instance_id, device_index, &wait.policy())
        .await
        .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::NoOp(_) => println!(
            "{}",
            format!("{} already attached to instance {}", eni_id, instance_id).yellow()
        ),
        Outcome::Completed(_) => println!(
            "{}",
            format!("{} attached to instance {}", eni_id, instance_id)
                .green()
                .bold()
        ),
    }
    Ok(())
}

/// Pick the attach target: an explicit instance id, or this machine.
/// Reject ids that do not name a real instance before any mutation.
async fn resolve_instance(
    provider: &Ec2EniProvider,
    instance_id: Option<String>,
) -> Result<String, String> {
    let instance_id = match instance_id {
        Some(id) => id,
        None => metadata::local_instance_id()
            .await
            .map_err(|e| e.to_string())?,
    };

    provider
        .describe_instance(&instance_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("no such instance {}", instance_id))?;

    Ok(instance_id)
}

fn confirm(message: &str) -> Result<bool, String> {
    print!("{} [Y/n]: ", message);
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;

    let answer = input.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

fn print_eni_table(enis: &[EniState]) {
    let headers = [
        "ENI ID",
        "PRIVATE DNS NAME",
        "PRIVATE IP",
        "INSTANCE ID",
        "DEVICE INDEX",
        "STATUS",
        "NAME",
    ];

    let rows: Vec<[String; 7]> = enis
        .iter()
        .map(|eni| {
            [
                eni.id.clone(),
                eni.private_dns_name.clone().unwrap_or_default(),
                eni.private_ip.clone().unwrap_or_default(),
                eni.attached_instance_id().unwrap_or("").to_string(),
                eni.attached_device_index().unwrap_or(-1).to_string(),
                eni.status.to_string(),
                eni.name.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", format_row(&headers).bold());
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("{}", format_row(&cells));
    }
}
