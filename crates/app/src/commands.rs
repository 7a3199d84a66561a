//! Command handlers for the `auditdesk` binary.
//!
//! Every handler goes through the route guard first, then the same view
//! models and workflow the library exposes.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context as _, anyhow, bail};
use serde::Serialize;
use tracing::{debug, warn};

use auditdesk_audits::{HistoryEntry, audit::unanswered};
use auditdesk_auth::{AuditAction, describe};
use auditdesk_client::{ApiClient, ApiError, AuditApi, AuditQuery, HistoryNote};
use auditdesk_core::{AggregateRoot, AuditId, CompanyId, DomainError, UserId};

use crate::cli::{AuditCommands, Commands, CompanyCommands, ListArgs, LoginArgs, NoteArgs, OutputFormat, UserCommands};
use crate::config::AppConfig;
use crate::forms::{FormController, LoginForm};
use crate::lifecycle::{AuditWorkflow, WorkflowError};
use crate::routes::{Guard, Route, guard};
use crate::session::{SessionReader, SessionStore};
use crate::storage::{FileStore, KeyValueStore};
use crate::views::{
    AuditFilter, AuditsView, CompaniesView, CompanyFilter, DeleteError, ListView, Listable, LoadError, SortDirection,
    SortState, UserFilter, UsersView, audits::load_audits, companies::load_companies, delete_company, delete_user,
    users::load_users,
};

/// Storage key of the backend's session cookies.
pub const COOKIES_KEY: &str = "cookies";

pub struct Context {
    client: Arc<ApiClient>,
    storage: Arc<dyn KeyValueStore>,
    session: SessionStore,
    format: OutputFormat,
}

impl Context {
    pub fn open(config: &AppConfig, format: OutputFormat) -> anyhow::Result<Self> {
        let client = ApiClient::new(config.client_config()).context("failed to build the HTTP client")?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.storage_path()));
        Ok(Self::with_parts(Arc::new(client), storage, format))
    }

    pub fn with_parts(client: Arc<ApiClient>, storage: Arc<dyn KeyValueStore>, format: OutputFormat) -> Self {
        match storage.get(COOKIES_KEY) {
            Ok(Some(cookies)) => client.import_cookies(&cookies),
            Ok(None) => {}
            Err(err) => warn!(error = %format!("{err:#}"), "ignoring unreadable saved cookies"),
        }
        let session = SessionStore::open(Arc::clone(&storage));
        Self {
            client,
            storage,
            session,
            format,
        }
    }

    pub fn reader(&self) -> SessionReader {
        self.session.reader()
    }

    /// Persist the cookie jar so the next invocation reuses the session.
    pub fn save_cookies(&self) -> anyhow::Result<()> {
        match self.client.export_cookies() {
            Some(cookies) => self.storage.set(COOKIES_KEY, &cookies),
            None => self.storage.remove(COOKIES_KEY),
        }
    }

    fn audit_api(&self) -> Arc<dyn AuditApi> {
        Arc::clone(&self.client) as Arc<dyn AuditApi>
    }

    /// The backend no longer knows this session; drop the local copy too.
    fn forget_if_expired(&self, err: &ApiError) {
        if matches!(err, ApiError::Unauthenticated) && self.session.is_authenticated() {
            warn!("backend rejected the stored session; signing out locally");
            if let Err(err) = self.session.logout() {
                warn!(error = %err, "failed to clear the stored session");
            }
        }
    }

    fn load_failure(&self, err: LoadError) -> anyhow::Error {
        if let LoadError::Api(api) = &err {
            self.forget_if_expired(api);
        }
        anyhow!(err.user_message())
    }

    fn delete_failure(&self, err: DeleteError) -> anyhow::Error {
        if let DeleteError::Api(api) = &err {
            self.forget_if_expired(api);
        }
        anyhow!(err.user_message())
    }

    fn workflow_failure(&self, err: WorkflowError) -> anyhow::Error {
        if let WorkflowError::Api(api) = &err {
            self.forget_if_expired(api);
        }
        anyhow!(err.user_message())
    }
}

/// Map a guard decision to a terminal error.
pub fn ensure(route: Route, session: &SessionReader) -> anyhow::Result<()> {
    match guard(route, session) {
        Guard::Allow => Ok(()),
        Guard::RedirectToLogin { .. } => bail!("Please log in first: auditdesk login --username <name>"),
        Guard::Forbidden => bail!("You do not have access to {route}."),
        Guard::RedirectToDashboard => bail!("Already signed in; run `auditdesk logout` first."),
    }
}

pub async fn dispatch(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    debug!(?command, "dispatching");
    match command {
        Commands::Login(args) => login(ctx, args).await,
        Commands::Logout => logout(ctx),
        Commands::Whoami => whoami(ctx),
        Commands::Companies {
            action: CompanyCommands::List { list, industry },
        } => list_companies(ctx, list, industry).await,
        Commands::Companies {
            action: CompanyCommands::Delete { id },
        } => remove_company(ctx, id).await,
        Commands::Users {
            action: UserCommands::List { list, role },
        } => list_users(ctx, list, role).await,
        Commands::Users {
            action: UserCommands::Delete { id },
        } => remove_user(ctx, id).await,
        Commands::Audits { action } => audits(ctx, action).await,
    }
}

async fn login(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    if ctx.session.is_authenticated() {
        ctx.session.logout()?;
    }
    let password = match args.password {
        Some(password) => password,
        None => read_password()?,
    };
    let mut form = FormController::new(LoginForm {
        username: args.username,
        password,
        return_to: None,
    });
    let (user, _) = crate::forms::login(ctx.client.as_ref(), &ctx.session, &mut form)
        .await
        .map_err(|err| match err {
            crate::forms::SubmitError::Invalid(errors) => anyhow!(
                "{}",
                errors.iter().map(|(f, m)| format!("{f}: {m}")).collect::<Vec<_>>().join("; ")
            ),
            other => anyhow!(other.to_string()),
        })?;
    println!("Signed in as {} ({})", user.display_name(), user.role);
    Ok(())
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read the password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.session.logout()?;
    ctx.storage.remove(COOKIES_KEY)?;
    println!("Signed out.");
    Ok(())
}

fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let Some(user) = ctx.session.current_user() else {
        println!("Not signed in.");
        return Ok(());
    };
    match ctx.format {
        OutputFormat::Json => print_json(&user),
        OutputFormat::Table => {
            let organization = user.organization.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string());
            println!("{} <{}>", user.display_name(), user.email);
            println!("role: {}  organization: {organization}", user.role);
            println!("{}", describe(user.role).description);
            let pages: Vec<String> = crate::routes::navigation(user.role).iter().map(Route::path).collect();
            println!("pages: {}", pages.join(" "));
            Ok(())
        }
    }
}

fn apply_list_args<T: Listable>(view: &mut ListView<T>, list: &ListArgs) {
    if let Some(search) = &list.search {
        view.set_search(search.clone());
    }
    if list.desc {
        view.query.sort.direction = SortDirection::Descending;
    }
}

async fn list_companies(ctx: &Context, list: ListArgs, industry: Option<String>) -> anyhow::Result<()> {
    let reader = ctx.reader();
    ensure(Route::Companies, &reader)?;
    let mut view: CompaniesView = load_companies(ctx.client.as_ref(), &reader)
        .await
        .map_err(|err| ctx.load_failure(err))?;
    view.set_filter(CompanyFilter {
        industry,
        ..CompanyFilter::default()
    });
    apply_list_args(&mut view, &list);

    let rows = view.visible();
    match ctx.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(
                &["ID", "NAME", "INDUSTRY", "SIZE", "LOCATION"],
                rows.iter()
                    .map(|c| vec![c.id.to_string(), c.name.clone(), c.industry.clone(), c.size.clone(), c.location.clone()])
                    .collect(),
            );
            Ok(())
        }
    }
}

async fn remove_company(ctx: &Context, id: CompanyId) -> anyhow::Result<()> {
    let reader = ctx.reader();
    ensure(Route::Companies, &reader)?;
    let mut view: CompaniesView = load_companies(ctx.client.as_ref(), &reader)
        .await
        .map_err(|err| ctx.load_failure(err))?;
    delete_company(ctx.client.as_ref(), &reader, &mut view, id)
        .await
        .map_err(|err| ctx.delete_failure(err))?;
    println!("Deleted company #{id}; {} remaining.", view.visible().len());
    Ok(())
}

async fn remove_user(ctx: &Context, id: UserId) -> anyhow::Result<()> {
    let reader = ctx.reader();
    ensure(Route::Users, &reader)?;
    let mut view: UsersView = load_users(ctx.client.as_ref(), &reader)
        .await
        .map_err(|err| ctx.load_failure(err))?;
    delete_user(ctx.client.as_ref(), &reader, &mut view, id)
        .await
        .map_err(|err| ctx.delete_failure(err))?;
    println!("Deleted user #{id}; {} remaining.", view.visible().len());
    Ok(())
}

async fn list_users(ctx: &Context, list: ListArgs, role: Option<auditdesk_core::Role>) -> anyhow::Result<()> {
    let reader = ctx.reader();
    ensure(Route::Users, &reader)?;
    let mut view: UsersView = load_users(ctx.client.as_ref(), &reader)
        .await
        .map_err(|err| ctx.load_failure(err))?;
    view.set_filter(UserFilter {
        role,
        ..UserFilter::default()
    });
    apply_list_args(&mut view, &list);

    let rows = view.visible();
    match ctx.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(
                &["ID", "USERNAME", "EMAIL", "ROLE", "ORGANIZATION"],
                rows.iter()
                    .map(|u| {
                        vec![
                            u.id.to_string(),
                            u.username.clone(),
                            u.email.clone(),
                            u.role.to_string(),
                            u.organization.map(|o| o.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect(),
            );
            Ok(())
        }
    }
}

async fn audits(ctx: &Context, action: AuditCommands) -> anyhow::Result<()> {
    match action {
        AuditCommands::List {
            list,
            status,
            company,
            sort,
        } => list_audits(ctx, list, status, company, sort.map(Into::into)).await,
        AuditCommands::Show { id } => show_audit(ctx, id).await,
        AuditCommands::Timeline { id } => {
            let workflow = open_workflow(ctx, id).await?;
            print_timeline(ctx, workflow.audit().timeline().entries())
        }
        AuditCommands::Start { id } => {
            transition(ctx, id, AuditAction::Start, |mut w| async move {
                let result = w.start().await;
                (w, result)
            })
            .await
        }
        AuditCommands::Complete { id } => {
            transition(ctx, id, AuditAction::Complete, |mut w| async move {
                let result = w.complete().await;
                (w, result)
            })
            .await
        }
        AuditCommands::Submit(NoteArgs { id, content, files }) => {
            transition(ctx, id, AuditAction::SubmitForReview, |mut w| async move {
                let result = w.submit_for_review(HistoryNote { content, files }).await;
                (w, result)
            })
            .await
        }
        AuditCommands::Feedback(NoteArgs { id, content, files }) => {
            transition(ctx, id, AuditAction::SendFeedback, |mut w| async move {
                let result = w.send_feedback(HistoryNote { content, files }).await;
                (w, result)
            })
            .await
        }
    }
}

async fn list_audits(
    ctx: &Context,
    list: ListArgs,
    status: Option<auditdesk_core::AuditStatus>,
    company: Option<auditdesk_core::CompanyId>,
    sort: Option<crate::views::AuditField>,
) -> anyhow::Result<()> {
    let reader = ctx.reader();
    ensure(Route::Audits, &reader)?;
    let query = AuditQuery {
        status,
        company,
        ..AuditQuery::default()
    };
    let mut view: AuditsView = load_audits(ctx.client.as_ref(), &reader, &query)
        .await
        .map_err(|err| ctx.load_failure(err))?;
    view.set_filter(AuditFilter {
        status,
        company,
        ..AuditFilter::default()
    });
    if let Some(field) = sort {
        view.query.sort = SortState::new(field, SortDirection::Ascending);
    }
    apply_list_args(&mut view, &list);

    let rows = view.visible();
    match ctx.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            print_table(
                &["ID", "NAME", "COMPANY", "STATUS", "DONE", "START", "END"],
                rows.iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.company_name.clone().unwrap_or_else(|| a.company.to_string()),
                            a.status.to_string(),
                            format!("{}%", a.completion_clamped()),
                            a.start_date.map(|d| d.to_string()).unwrap_or_default(),
                            a.end_date.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect(),
            );
            Ok(())
        }
    }
}

async fn open_workflow(ctx: &Context, id: AuditId) -> anyhow::Result<AuditWorkflow> {
    let reader = ctx.reader();
    ensure(Route::AuditDetail(id), &reader)?;
    AuditWorkflow::load(ctx.audit_api(), reader, id)
        .await
        .map_err(|err| ctx.workflow_failure(err))
}

#[derive(Serialize)]
struct AuditDetail {
    #[serde(flatten)]
    audit: auditdesk_audits::AuditRecord,
    answered_ratio: Option<f32>,
    unanswered: usize,
    awaiting_review: bool,
    actions: Vec<&'static str>,
}

async fn show_audit(ctx: &Context, id: AuditId) -> anyhow::Result<()> {
    let workflow = open_workflow(ctx, id).await?;
    let audit = workflow.audit();
    let detail = AuditDetail {
        audit: workflow.snapshot(),
        answered_ratio: audit.answered_ratio(),
        unanswered: unanswered(audit.questions()),
        awaiting_review: audit.awaiting_review(),
        actions: workflow.available_actions().iter().map(|a| a.as_str()).collect(),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Table => {
            println!("#{} {}", audit.id(), audit.name());
            println!(
                "company: {}",
                audit.company_name().map(str::to_string).unwrap_or_else(|| audit.company().to_string())
            );
            println!("status: {}  completion: {}%", audit.status(), audit.completion());
            if let Some(ratio) = detail.answered_ratio {
                println!(
                    "questions answered: {:.0}% of {} ({} open)",
                    ratio * 100.0,
                    audit.questions().len(),
                    detail.unanswered
                );
            }
            if detail.awaiting_review {
                println!("a submission is awaiting expert review");
            }
            let actions = if detail.actions.is_empty() { "-".to_string() } else { detail.actions.join(", ") };
            println!("actions: {actions}");
            println!("history entries: {}", audit.timeline().len());
            Ok(())
        }
    }
}

async fn transition<F, Fut>(ctx: &Context, id: AuditId, requested: AuditAction, action: F) -> anyhow::Result<()>
where
    F: FnOnce(AuditWorkflow) -> Fut,
    Fut: std::future::Future<Output = (AuditWorkflow, Result<(), WorkflowError>)>,
{
    let workflow = open_workflow(ctx, id).await?;
    let (workflow, result) = action(workflow).await;
    if let Err(err) = result {
        let refused = matches!(err, WorkflowError::Domain(DomainError::Unauthorized(_)));
        let mut message = ctx.workflow_failure(err).to_string();
        if refused {
            message.push_str(&refusal_hints(&workflow, requested));
        }
        bail!(message);
    }

    let audit = workflow.audit();
    match ctx.format {
        OutputFormat::Json => print_json(&workflow.snapshot()),
        OutputFormat::Table => {
            println!("#{} {}: {} ({}%)", audit.id(), audit.name(), audit.status(), audit.completion());
            Ok(())
        }
    }
}

/// Suggestions appended to a refused lifecycle action.
fn refusal_hints(workflow: &AuditWorkflow, requested: AuditAction) -> String {
    let Some(explanation) = workflow.explain(requested) else {
        return String::new();
    };
    explanation
        .suggestions
        .iter()
        .map(|hint| format!("\nhint: {hint}"))
        .collect()
}

fn print_timeline(ctx: &Context, entries: &[HistoryEntry]) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Table => {
            print_table(
                &["DATE", "TYPE", "CONTENT", "FILES"],
                entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.date.format("%Y-%m-%d %H:%M").to_string(),
                            e.kind.as_str().to_string(),
                            e.content.clone(),
                            e.files.join(", "),
                        ]
                    })
                    .collect(),
            );
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("failed to serialize output")?);
    Ok(())
}

fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

/// Left-aligned columns separated by two spaces.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.to_vec());
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_core::{CompanyId, Role, UserId};
    use auditdesk_directory::User;

    fn reader(role: Option<Role>) -> SessionReader {
        SessionReader::fixed(role.map(|role| User {
            id: UserId::new(1),
            username: "u".to_string(),
            email: "u@x.io".to_string(),
            role,
            organization: (role == Role::Participant).then(|| CompanyId::new(1)),
            phone: None,
            first_name: String::new(),
            last_name: String::new(),
            date_joined: None,
        }))
    }

    #[test]
    fn guard_decisions_become_messages() {
        assert!(ensure(Route::Audits, &reader(Some(Role::Participant))).is_ok());

        let err = ensure(Route::Audits, &reader(None)).unwrap_err();
        assert!(err.to_string().starts_with("Please log in first"));

        let err = ensure(Route::Users, &reader(Some(Role::Expert))).unwrap_err();
        assert_eq!(err.to_string(), "You do not have access to /users.");
    }

    #[test]
    fn table_columns_align_on_the_widest_cell() {
        let out = render_table(
            &["ID", "NAME"],
            &[
                vec!["1".to_string(), "Acme".to_string()],
                vec!["12".to_string(), "Initech".to_string()],
            ],
        );
        assert_eq!(out, "ID  NAME\n1   Acme\n12  Initech\n");
    }

    #[test]
    fn saved_cookies_are_restored_into_the_client() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(crate::storage::MemoryStore::new());
        storage.set(COOKIES_KEY, "sessionid=abc; csrftoken=tok").unwrap();

        let client = Arc::new(ApiClient::new(auditdesk_client::ClientConfig::default()).unwrap());
        let ctx = Context::with_parts(client, Arc::clone(&storage), OutputFormat::Table);

        let cookies = ctx.client.export_cookies().unwrap();
        assert!(cookies.contains("sessionid=abc"));
        assert!(!ctx.reader().is_authenticated());

        ctx.save_cookies().unwrap();
        assert!(storage.get(COOKIES_KEY).unwrap().unwrap().contains("csrftoken=tok"));
    }
}
