use serde::Deserialize;
use busline_proto::Subject;

#[derive(Debug, Deserialize)]
pub(super) struct FromEnv {
    #[serde(flatten)]
    pub(super) auth: AuthenticationMethod,
    pub(super) inbox_prefix: Option<Subject>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum AuthenticationMethod {
    UserAndPassword {
        #[serde(rename = "bus_username")]
        username: String,
        #[serde(rename = "bus_password")]
        password: String,
    },
    None,
}
