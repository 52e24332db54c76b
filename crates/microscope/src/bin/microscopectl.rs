use chrono::Utc;
use microscope::store::writer::new_job;
use microscope::store::{RedisWorkClient, WorkClient, WorkerObservation, WorkerPoolHeartbeat};
use microscope::Config;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::env;

const JOB_NAMES: &[&str] = &["send_email", "resize_image", "sync_account"];
const ERRORS: &[&str] = &["smtp timeout", "connection refused", "invalid payload"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "microscopectl <command>\n\
             Commands:\n\
             - reset\n\
             - seed <n>\n\
             - demo\n\
             - counts\n\
             \n\
             Uses MICROSCOPE_REDIS_URL and MICROSCOPE_NAMESPACE.\n"
        );
        std::process::exit(2);
    }

    let cfg = Config::from_env()?;
    let client = RedisWorkClient::connect(&cfg.redis_url, &cfg.namespace).await?;

    match args[1].as_str() {
        "reset" => reset(&client).await?,
        "seed" => {
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
            seed(&client, n).await?;
        }
        "demo" => {
            reset(&client).await?;
            seed(&client, 30).await?;
            seed_workers(&client).await?;
            show_counts(&client).await?;
        }
        "counts" => show_counts(&client).await?,
        other => {
            eprintln!("Unknown command: {other}");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn reset(client: &RedisWorkClient) -> anyhow::Result<()> {
    if client.keys().prefix().is_empty() {
        anyhow::bail!("refusing to reset an empty namespace");
    }

    let removed = client.writer().reset().await?;
    println!("reset OK ({removed} keys under {})", client.keys().prefix());
    Ok(())
}

async fn seed(client: &RedisWorkClient, n: usize) -> anyhow::Result<()> {
    let writer = client.writer();
    let mut rng = rand::thread_rng();
    let now = Utc::now().timestamp();

    for i in 0..n {
        let name = JOB_NAMES.choose(&mut rng).copied().unwrap_or("send_email");
        let mut args = Map::new();
        args.insert("seq".to_string(), Value::from(i));

        let mut job = new_job(name, args);

        match i % 4 {
            0 => {
                writer.enqueue(&job).await?;
                println!("+ queued {name} id={}", job.id);
            }
            1 => {
                let run_at = now + rng.gen_range(60..3_600);
                writer.schedule(&job, run_at).await?;
                println!("+ scheduled {name} id={} run_at={run_at}", job.id);
            }
            2 => {
                job.fails = rng.gen_range(1..4);
                job.last_err = ERRORS.choose(&mut rng).copied().unwrap_or("error").into();
                job.failed_at = now;
                let retry_at = now + rng.gen_range(10..600);
                writer.register_job(name).await?;
                writer.add_retry(&job, retry_at).await?;
                println!("+ retrying {name} id={} retry_at={retry_at}", job.id);
            }
            _ => {
                job.fails = 25;
                job.last_err = ERRORS.choose(&mut rng).copied().unwrap_or("error").into();
                job.failed_at = now;
                writer.register_job(name).await?;
                writer.add_dead(&job, now).await?;
                println!("+ dead {name} id={} died_at={now}", job.id);
            }
        }
    }
    Ok(())
}

async fn seed_workers(client: &RedisWorkClient) -> anyhow::Result<()> {
    let writer = client.writer();
    let now = Utc::now().timestamp();
    let worker_ids: Vec<String> = (1..=3).map(|i| format!("demo-worker-{i}")).collect();

    writer
        .write_heartbeat(&WorkerPoolHeartbeat {
            worker_pool_id: "demo-pool".to_string(),
            started_at: now - 3_600,
            heartbeat_at: now,
            job_names: JOB_NAMES.iter().map(|s| s.to_string()).collect(),
            concurrency: worker_ids.len() as u32,
            host: "localhost".to_string(),
            pid: std::process::id() as i64,
            worker_ids: worker_ids.clone(),
        })
        .await?;

    for (i, worker_id) in worker_ids.iter().enumerate() {
        let busy = i == 0;
        writer
            .write_observation(&WorkerObservation {
                worker_id: worker_id.clone(),
                is_busy: busy,
                job_name: if busy { "send_email".into() } else { String::new() },
                job_id: if busy { "demo-job".into() } else { String::new() },
                started_at: if busy { now - 5 } else { 0 },
                args_json: if busy {
                    json!({"to": "ops@example.com"}).to_string()
                } else {
                    String::new()
                },
                checkin: String::new(),
                checkin_at: 0,
            })
            .await?;
    }

    println!("+ worker pool demo-pool with {} workers", worker_ids.len());
    Ok(())
}

async fn show_counts(client: &RedisWorkClient) -> anyhow::Result<()> {
    for q in client.queues().await? {
        println!("queue {}: pending={} latency={}s", q.job_name, q.count, q.latency);
    }

    let retry = client.retry_jobs(1).await?.total;
    let scheduled = client.scheduled_jobs(1).await?.total;
    let dead = client.dead_jobs(1).await?.total;
    let busy = client
        .worker_observations()
        .await?
        .iter()
        .filter(|ob| ob.is_busy)
        .count();

    println!("jobs: retry={retry} scheduled={scheduled} dead={dead} busy_workers={busy}");
    Ok(())
}
