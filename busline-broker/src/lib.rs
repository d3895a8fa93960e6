pub use busline_proto as proto;

mod atomic;
mod client;
mod handler;
mod multiplexed_subscription;
mod ops;
mod subscription;
#[cfg(test)]
pub(crate) mod tests;

pub use self::ops::{BusOps, MeteredSubscription, PublishFailed, SubscribeFailed};

pub mod core {
    //! Broker connector and bus operations

    pub use crate::client::{Client, ClientBuilder, Echo, QuickInfo};
    pub(crate) use crate::multiplexed_subscription::MultiplexedSubscription;
    pub use crate::subscription::Subscription;
    pub use busline_mini::AuthenticationMethod;

    pub mod publish {
        //! Utilities for publishing messages

        pub use crate::client::{
            ClientPublish, DoClientPublish, DoOwnedClientPublish, OwnedClientPublish, Publish,
            PublishBuilder,
        };
    }

    pub mod request {
        //! Utilities for publishing messages and awaiting for a response

        pub use crate::client::{
            ClientRequest, DoClientRequest, DoOwnedClientRequest, OwnedClientRequest, Request,
            RequestBuilder, ResponseFut,
        };
    }

    pub mod error {
        //! Broker connector specific errors

        pub use crate::client::{ClientClosedError, ResponseError, TryCommandError};
    }
}
