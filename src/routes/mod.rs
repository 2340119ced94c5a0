/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// Access control is applied explicitly at the route level (via Axum layers),
/// preventing accidental exposure of protected endpoints.

/// Routes accessible to all clients: the health probe and the login gateway.
pub mod public;

/// Routes behind the bearer-token verifier. Reads require any authenticated
/// principal; post writes additionally carry the ADMIN gate and comment
/// writes the USER gate, attached per method.
pub mod authenticated;

/// Routes restricted exclusively to principals holding the ADMIN role
/// (user management).
pub mod admin;
