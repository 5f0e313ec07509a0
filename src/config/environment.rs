//! Build server detection

/// Variables whose presence marks a CI / build server environment
pub const SERVER_BUILD_VARS: &[&str] = &[
    "CI",
    "TF_BUILD",
    "JENKINS_URL",
    "GITHUB_ACTIONS",
    "TEAMCITY_VERSION",
    "GITLAB_CI",
    "APPVEYOR",
    "BUILD_NUMBER",
];

/// Whether this process runs on a build server
pub fn is_server_build() -> bool {
    is_server_build_with(|name| std::env::var(name).ok())
}

/// [`is_server_build`] with an injectable variable lookup
pub fn is_server_build_with<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    SERVER_BUILD_VARS
        .iter()
        .any(|name| lookup(name).is_some_and(|v| !v.trim().is_empty()))
}
