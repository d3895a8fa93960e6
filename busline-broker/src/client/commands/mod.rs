pub use self::publish::{
    ClientPublish, DoClientPublish, DoOwnedClientPublish, OwnedClientPublish, Publish,
    PublishBuilder,
};
pub use self::request::{
    ClientRequest, DoClientRequest, DoOwnedClientRequest, OwnedClientRequest, Request,
    RequestBuilder, ResponseError, ResponseFut,
};

mod publish;
mod request;
