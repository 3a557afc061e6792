use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz show backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::display_stream,
        crate::routes::session::session_status,
        crate::routes::session::login,
        crate::routes::session::logout,
        crate::routes::session::reset_all,
        crate::routes::session::clear_all,
        crate::routes::session::export,
        crate::routes::session::restore,
        crate::routes::questions::list_questions,
        crate::routes::questions::add_question,
        crate::routes::questions::question_stats,
        crate::routes::questions::bulk_import,
        crate::routes::questions::import_csv,
        crate::routes::questions::apply_global_time,
        crate::routes::questions::reset_questions,
        crate::routes::questions::grid,
        crate::routes::judges::list_judges,
        crate::routes::judges::available_judges,
        crate::routes::judges::create_judge,
        crate::routes::judges::update_judge,
        crate::routes::judges::delete_judge,
        crate::routes::judges::reset_final_round,
        crate::routes::teams::list_teams,
        crate::routes::teams::create_team,
        crate::routes::teams::delete_team,
        crate::routes::teams::pick_team,
        crate::routes::console::console_snapshot,
        crate::routes::console::select_question,
        crate::routes::console::submit_answer,
        crate::routes::console::reveal_answer,
        crate::routes::console::start_challenge,
        crate::routes::console::answer_sub_question,
        crate::routes::console::close,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleConsolePhase,
            crate::dto::session::LoginRequest,
            crate::dto::session::SessionStatus,
            crate::dto::session::ActionResponse,
            crate::dto::session::ExportResponse,
            crate::dto::session::RestoreRequest,
            crate::dto::question::QuestionInput,
            crate::dto::question::BulkImportRequest,
            crate::dto::question::GlobalTimeRequest,
            crate::dto::question::CsvImportRequest,
            crate::dto::question::ImportSummary,
            crate::dto::question::QuestionStats,
            crate::dto::question::QuestionSummary,
            crate::dto::question::CellState,
            crate::dto::question::GridCellView,
            crate::dto::question::GridResponse,
            crate::dto::judge::JudgeKind,
            crate::dto::judge::JudgeInput,
            crate::dto::judge::ChallengeQuestionInput,
            crate::dto::judge::ChallengeQuestionSummary,
            crate::dto::judge::JudgeSummary,
            crate::dto::team::TeamInput,
            crate::dto::team::TeamSummary,
            crate::dto::console::SelectQuestionRequest,
            crate::dto::console::AnswerRequest,
            crate::dto::console::StartChallengeRequest,
            crate::dto::console::SubAnswerRequest,
            crate::dto::console::AnswerResponse,
            crate::dto::console::SubAnswerResponse,
            crate::dto::console::ConsoleSnapshot,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::TimerTickEvent,
            crate::dto::sse::TimerCueEvent,
            crate::dto::sse::TimesUpScope,
            crate::dto::sse::TimesUpEvent,
            crate::dto::sse::GridUpdatedEvent,
            crate::dto::sse::JudgesUpdatedEvent,
            crate::dto::sse::TeamPickedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream for the presentation display"),
        (name = "session", description = "Operator login, resets, backup and restore"),
        (name = "questions", description = "Question bank and selection grids"),
        (name = "judges", description = "Judge panel and final round"),
        (name = "teams", description = "Team registry"),
        (name = "console", description = "Live presentation control"),
    )
)]
pub struct ApiDoc;
