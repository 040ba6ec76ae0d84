// Copyright (c) 2024-2026 The HLF SDK Authors

//! Messages from `orderer/ab.proto` and the AtomicBroadcast client.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BroadcastResponse {
    #[prost(enumeration = "super::common::Status", tag = "1")]
    pub status: i32,
    /// Human-readable detail when the envelope was refused.
    #[prost(string, tag = "2")]
    pub info: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekNewest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekOldest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekSpecified {
    #[prost(uint64, tag = "1")]
    pub number: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekPosition {
    #[prost(oneof = "seek_position::Type", tags = "1, 2, 3")]
    pub r#type: ::core::option::Option<seek_position::Type>,
}

pub mod seek_position {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "1")]
        Newest(super::SeekNewest),
        #[prost(message, tag = "2")]
        Oldest(super::SeekOldest),
        #[prost(message, tag = "3")]
        Specified(super::SeekSpecified),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekInfo {
    #[prost(message, optional, tag = "1")]
    pub start: ::core::option::Option<SeekPosition>,
    #[prost(message, optional, tag = "2")]
    pub stop: ::core::option::Option<SeekPosition>,
    #[prost(enumeration = "seek_info::SeekBehavior", tag = "3")]
    pub behavior: i32,
    #[prost(enumeration = "seek_info::SeekErrorResponse", tag = "4")]
    pub error_response: i32,
}

pub mod seek_info {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SeekBehavior {
        BlockUntilReady = 0,
        FailIfNotReady = 1,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum SeekErrorResponse {
        Strict = 0,
        BestEffort = 1,
    }
}

/// Response stream element of the orderer Deliver call.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeliverResponse {
    #[prost(oneof = "deliver_response::Type", tags = "1, 2")]
    pub r#type: ::core::option::Option<deliver_response::Type>,
}

pub mod deliver_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(enumeration = "super::super::common::Status", tag = "1")]
        Status(i32),
        #[prost(message, tag = "2")]
        Block(super::super::common::Block),
    }
}

pub mod atomic_broadcast_client {
    //! Client for the `orderer.AtomicBroadcast` service.

    use super::*;
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct AtomicBroadcastClient {
        inner: tonic::client::Grpc<tonic::transport::Channel>,
    }

    impl AtomicBroadcastClient {
        pub fn new(channel: tonic::transport::Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        /// Limits the maximum size of a decoded message.
        #[must_use]
        pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_decoding_message_size(limit);
            self
        }

        /// Limits the maximum size of an encoded message.
        #[must_use]
        pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
            self.inner = self.inner.max_encoding_message_size(limit);
            self
        }

        /// Submits signed envelopes for ordering; one response is returned
        /// per submitted envelope.
        pub async fn broadcast(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::super::common::Envelope>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::BroadcastResponse>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {e}"))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/orderer.AtomicBroadcast/Broadcast");
            let mut req = request.into_streaming_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("orderer.AtomicBroadcast", "Broadcast"));
            self.inner.streaming(req, path, codec).await
        }

        /// The client streams signed `SeekInfo` envelopes; the service
        /// answers with the requested block range in ledger order.
        pub async fn deliver(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::super::common::Envelope>,
        ) -> std::result::Result<
            tonic::Response<tonic::codec::Streaming<super::DeliverResponse>>,
            tonic::Status,
        > {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {e}"))
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/orderer.AtomicBroadcast/Deliver");
            let mut req = request.into_streaming_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("orderer.AtomicBroadcast", "Deliver"));
            self.inner.streaming(req, path, codec).await
        }
    }
}
