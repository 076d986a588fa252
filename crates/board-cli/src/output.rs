use board_core::{Application, DashboardStats, Job, Salary, UserAccount, UserIdentity};
use colored::Colorize;

pub fn format_salary(salary: &Salary) -> String {
    match (salary.min, salary.max) {
        (Some(min), Some(max)) => format!("{} {}-{}", salary.currency, min, max),
        (Some(min), None) => format!("{} {}+", salary.currency, min),
        (None, Some(max)) => format!("{} up to {}", salary.currency, max),
        (None, None) => "salary not listed".to_string(),
    }
}

pub fn print_user(user: &UserIdentity) {
    println!(
        "{} {} <{}> ({})",
        "●".green(),
        user.username.bold(),
        user.email,
        user.role.to_string().cyan()
    );
}

pub fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("{}", "No jobs match the current filters.".dimmed());
        return;
    }

    for job in jobs {
        let marker = if job.featured { "★".yellow() } else { " ".normal() };
        println!(
            "{} {:>4}  {}  {} · {}",
            marker,
            job.id,
            job.title.bold(),
            job.company,
            job.location
        );
        println!(
            "        {}  {}",
            format!("[{}]", job.category).cyan(),
            format_salary(&job.salary).dimmed()
        );
    }
    println!("{}", format!("{} job(s)", jobs.len()).dimmed());
}

pub fn print_applications(applications: &[Application]) {
    if applications.is_empty() {
        println!("{}", "No applications yet.".dimmed());
        return;
    }

    for application in applications {
        let applied = application
            .applied_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>4}  {}  {} <{}>  {}  {}",
            application.id,
            application.job_title().bold(),
            application.full_name,
            application.email,
            application.status.to_string().cyan(),
            applied.dimmed()
        );
    }
}

pub fn print_users(users: &[UserAccount]) {
    if users.is_empty() {
        println!("{}", "No users.".dimmed());
        return;
    }

    for user in users {
        let joined = user
            .date_joined
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>4}  {} <{}>  {}  {}",
            user.id,
            user.username.bold(),
            user.email,
            user.role.to_string().cyan(),
            joined.dimmed()
        );
    }
    println!("{}", format!("{} user(s)", users.len()).dimmed());
}

pub fn print_stats(stats: &DashboardStats) {
    println!("{}", "Dashboard".bold());
    println!("  jobs          {}", stats.jobs);
    println!("  applications  {}", stats.applications);
    println!("  users         {}", stats.users);
    println!("  conversion    {:.1}%", stats.conversion_rate);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salary(min: Option<i64>, max: Option<i64>) -> Salary {
        Salary {
            min,
            max,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn salary_ranges() {
        assert_eq!(format_salary(&salary(Some(50), Some(70))), "USD 50-70");
        assert_eq!(format_salary(&salary(Some(50), None)), "USD 50+");
        assert_eq!(format_salary(&salary(None, Some(70))), "USD up to 70");
        assert_eq!(format_salary(&salary(None, None)), "salary not listed");
    }
}
