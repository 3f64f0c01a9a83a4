//! # Jobs Command
//!
//! Lists public job postings. Works with or without a session.
//!
//! ```bash
//! portal jobs --category design --search barista
//! portal jobs --summary --category design --category kitchen
//! ```

use anyhow::Result;
use colored::Colorize;

use crate::api::{ApiClient, Job, JobQuery, PageRequest};
use crate::errors::display_validation_error;
use crate::exit_codes::*;

use super::{build_client, print_json, report};

/// Arguments for the jobs command
#[derive(Debug, Clone, Default)]
pub struct JobsArgs {
    /// Category filter; several are allowed with `--summary`
    pub categories: Vec<String>,
    /// Free-text search
    pub search: Option<String>,
    /// Page to fetch
    pub page: Option<u32>,
    /// Jobs per page
    pub limit: Option<u32>,
    /// Show counts instead of listings
    pub summary: bool,
    /// Output as JSON
    pub json: bool,
}

/// Execute the jobs command
pub async fn execute(args: JobsArgs) -> Result<i32> {
    let client = build_client()?;
    run(&client, &args).await
}

pub(crate) async fn run(client: &ApiClient, args: &JobsArgs) -> Result<i32> {
    if args.summary {
        return run_summary(client, args).await;
    }

    let query = match to_query(args) {
        Ok(query) => query,
        Err(message) => {
            display_validation_error(&message);
            return Ok(EXIT_INVALID_INPUT);
        }
    };

    let jobs = match client.list_jobs(&query).await {
        Ok(jobs) => jobs,
        Err(e) => return Ok(report(&e)),
    };

    if args.json {
        print_json(&jobs)?;
        return Ok(EXIT_SUCCESS);
    }

    if jobs.is_empty() {
        println!("{}", "No jobs found.".dimmed());
        return Ok(EXIT_SUCCESS);
    }
    for job in &jobs {
        println!("{}", job_line(job));
    }
    Ok(EXIT_SUCCESS)
}

async fn run_summary(client: &ApiClient, args: &JobsArgs) -> Result<i32> {
    let summary = match client.job_summary(&args.categories).await {
        Ok(summary) => summary,
        Err(e) => return Ok(report(&e)),
    };

    if args.json {
        print_json(&summary)?;
        return Ok(EXIT_SUCCESS);
    }

    println!("{} {}", "Total jobs:".bold(), summary.total);
    for (category, count) in &summary.by_category {
        println!("  {:<20} {}", category, count);
    }
    if !summary.by_category.is_empty() {
        println!("  {:<20} {}", "other".dimmed(), summary.other());
    }
    Ok(EXIT_SUCCESS)
}

fn to_query(args: &JobsArgs) -> Result<JobQuery, String> {
    if args.categories.len() > 1 {
        return Err("Only one --category can be used when listing jobs".to_string());
    }

    let page = match (args.page, args.limit) {
        (None, None) => None,
        (page, limit) => Some(PageRequest::new(
            page.unwrap_or(1),
            limit.unwrap_or(crate::api::DEFAULT_PAGE_SIZE),
        )),
    };

    Ok(JobQuery {
        category: args.categories.first().cloned(),
        search: args.search.clone().filter(|s| !s.trim().is_empty()),
        page,
    })
}

fn job_line(job: &Job) -> String {
    let mut line = format!("{:>6}  {}", job.id.to_string().dimmed(), job.title.bold());
    if let Some(category) = &job.category {
        line.push_str(&format!("  [{}]", category.cyan()));
    }
    if let Some(location) = &job.location {
        line.push_str(&format!("  {}", location));
    }
    line
}
