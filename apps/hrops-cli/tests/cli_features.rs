//! Argument parsing for every command

use clap::Parser;
use hrops_cli::{
    AttendanceCommand, Cli, Commands, CreateTaskArgs, DepartmentCommand, NoticeCommand,
    TaskCommand,
};

#[test]
fn test_core_command_parsing() {
    let test_cases = vec![
        vec!["hrops", "migrate"],
        vec!["hrops", "health"],
        vec!["hrops", "tasks", "list"],
        vec!["hrops", "tasks", "ongoing"],
        vec!["hrops", "tasks", "create", "Review PR"],
        vec!["hrops", "tasks", "complete", "3"],
        vec!["hrops", "tasks", "delete", "3"],
        vec!["hrops", "notices", "list"],
        vec!["hrops", "notices", "create", "Office closed"],
        vec!["hrops", "attendance", "today"],
        vec!["hrops", "attendance", "check-in"],
        vec!["hrops", "attendance", "check-out", "9"],
        vec!["hrops", "attendance", "range", "2024-05-01", "2024-05-31"],
        vec!["hrops", "departments", "list"],
        vec!["hrops", "departments", "create", "Finance"],
    ];

    for args in test_cases {
        let cli = Cli::try_parse_from(args.clone());
        assert!(cli.is_ok(), "Failed to parse: {:?}", args);
    }
}

#[test]
fn test_missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(vec!["hrops"]).is_err());
    assert!(Cli::try_parse_from(vec!["hrops", "tasks"]).is_err());
    assert!(Cli::try_parse_from(vec!["hrops", "tasks", "complete", "abc"]).is_err());
}

#[test]
fn test_cli_verbose_flag() {
    let args = vec!["hrops", "--verbose", "health"];
    let cli = Cli::try_parse_from(args).unwrap();

    assert!(cli.verbose, "Verbose flag should be set");
    assert!(!cli.json_logs);
}

#[test]
fn test_cli_database_path() {
    let args = vec!["hrops", "--database", "/custom/hr.sqlite", "health"];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(cli.database.unwrap().to_str().unwrap(), "/custom/hr.sqlite");
}

#[test]
fn test_identity_flags() {
    let args = vec![
        "hrops",
        "--company",
        "42",
        "--user",
        "6f1c7c7e-2f4b-4c1e-9a57-1b2d3c4d5e6f",
        "--department",
        "1",
        "notices",
        "list",
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(cli.company, Some(42));
    assert_eq!(
        cli.user.unwrap().to_string(),
        "6f1c7c7e-2f4b-4c1e-9a57-1b2d3c4d5e6f"
    );
    assert_eq!(cli.department, Some(1));
}

#[test]
fn test_invalid_user_is_rejected() {
    let args = vec!["hrops", "--user", "not-a-uuid", "attendance", "today"];
    assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn test_task_create_with_assignees() {
    let args = vec![
        "hrops",
        "tasks",
        "create",
        "Review PR",
        "--assignee",
        "u1",
        "--assignee",
        "u2",
        "--priority",
        "high",
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(
        cli.command,
        Commands::Tasks {
            action: TaskCommand::Create(CreateTaskArgs {
                title: "Review PR".to_string(),
                description: None,
                assignees: vec!["u1".to_string(), "u2".to_string()],
                priority: Some("high".to_string()),
            })
        }
    );
}

#[test]
fn test_tasks_list_with_limit() {
    let args = vec!["hrops", "tasks", "list", "--limit", "5"];
    let cli = Cli::try_parse_from(args).unwrap();

    if let Commands::Tasks {
        action: TaskCommand::List { limit },
    } = cli.command
    {
        assert_eq!(limit, Some(5));
    } else {
        panic!("Expected Tasks List command");
    }
}

#[test]
fn test_ongoing_with_assignee() {
    let args = vec!["hrops", "tasks", "ongoing", "--assignee", "u1"];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(
        cli.command,
        Commands::Tasks {
            action: TaskCommand::Ongoing {
                assignee: Some("u1".to_string())
            }
        }
    );
}

#[test]
fn test_attendance_range_needs_both_dates() {
    assert!(Cli::try_parse_from(vec!["hrops", "attendance", "range", "2024-05-01"]).is_err());

    let cli =
        Cli::try_parse_from(vec!["hrops", "attendance", "range", "05/01/2024", "2024-05-31"])
            .unwrap();
    assert_eq!(
        cli.command,
        Commands::Attendance {
            action: AttendanceCommand::Range {
                from: "05/01/2024".to_string(),
                to: "2024-05-31".to_string(),
            }
        }
    );
}

#[test]
fn test_global_notice_flag() {
    let args = vec!["hrops", "notices", "create", "Holiday", "--global"];
    let cli = Cli::try_parse_from(args).unwrap();

    if let Commands::Notices {
        action: NoticeCommand::Create { title, global, .. },
    } = cli.command
    {
        assert_eq!(title, "Holiday");
        assert!(global);
    } else {
        panic!("Expected Notices Create command");
    }
}

#[test]
fn test_check_in_with_site() {
    let args = vec!["hrops", "attendance", "check-in", "--site", "4"];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(
        cli.command,
        Commands::Attendance {
            action: AttendanceCommand::CheckIn { site: Some(4) }
        }
    );
}

#[test]
fn test_department_create_with_description() {
    let args = vec![
        "hrops",
        "departments",
        "create",
        "Finance",
        "--description",
        "Books and payroll",
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(
        cli.command,
        Commands::Departments {
            action: DepartmentCommand::Create {
                name: "Finance".to_string(),
                description: Some("Books and payroll".to_string()),
            }
        }
    );
}
