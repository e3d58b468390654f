use utoipa::OpenApi;

/// OpenAPI document for the workshop API, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workshop API",
        description = "Workshop management backend: customers, vehicles, parts inventory, quotes and service orders",
        version = env!("CARGO_PKG_VERSION"),
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::users::CreateUserInput,
        crate::services::vehicles::CreateVehicleInput,
        crate::services::vehicles::UpdateVehicleInput,
        crate::services::parts::CreatePartInput,
        crate::services::parts::UpdatePartInput,
        crate::services::parts::AvailabilityReport,
        crate::handlers::parts::AdjustStockRequest,
        crate::handlers::quotes::CreateQuoteRequest,
        crate::handlers::quotes::UpdateQuoteRequest,
        crate::handlers::quotes::RejectQuoteRequest,
        crate::handlers::quotes::GenerateServiceOrderRequest,
        crate::handlers::service_orders::AddPartRequest,
    )),
    tags(
        (name = "users", description = "Customers and staff"),
        (name = "vehicles", description = "Customer vehicles"),
        (name = "parts", description = "Parts catalog and stock ledger"),
        (name = "quotes", description = "Quotes and their approval workflow"),
        (name = "service-orders", description = "Service order execution and stock reconciliation"),
    )
)]
pub struct ApiDoc;
