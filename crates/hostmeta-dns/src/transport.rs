//! DNS transport: zone transfers over TCP, TXT queries over UDP

use std::future::Future;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, Record, RecordType};
use hickory_proto::serialize::binary::BinEncodable;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket, lookup_host};
use tracing::{debug, instrument};

use crate::error::DnsError;
use crate::tsig::TsigKey;

/// Largest UDP answer we accept
const MAX_UDP_SIZE: usize = 4096;

/// Network access used by the DNS datasource
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Transfer a whole zone (AXFR) and return every record in it
    async fn transfer(&self, zone: &Name) -> Result<Vec<Record>, DnsError>;

    /// Query the TXT records of a single name, returning the answer section
    async fn query_txt(&self, name: &Name) -> Result<Vec<Record>, DnsError>;
}

/// Plain TCP/UDP transport against one DNS server
///
/// Every request opens its own socket; nothing is kept between calls.
#[derive(Debug)]
pub struct TcpUdpTransport {
    /// Server address (`host:port`)
    server: String,
    /// Dial/read/write timeout
    timeout: Duration,
    /// Optional TSIG key for zone transfers
    tsig: Option<TsigKey>,
}

impl TcpUdpTransport {
    /// Create a transport for `server`
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
            tsig: None,
        }
    }

    /// Sign zone transfer requests and verify their answers with TSIG
    #[must_use]
    pub fn with_tsig(mut self, key: TsigKey) -> Self {
        self.tsig = Some(key);
        self
    }

    async fn server_addr(&self) -> Result<SocketAddr, DnsError> {
        let mut addrs = self.timed(lookup_host(self.server.as_str())).await?;
        addrs
            .next()
            .ok_or_else(|| DnsError::Io(format!("cannot resolve server address: {}", self.server)))
    }

    /// Run an I/O future under the configured timeout
    async fn timed<T, F>(&self, fut: F) -> Result<T, DnsError>
    where
        F: Future<Output = std::io::Result<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| DnsError::Timeout(self.timeout))?
            .map_err(DnsError::from)
    }

    async fn connect_tcp(&self) -> Result<TcpStream, DnsError> {
        let addr = self.server_addr().await?;
        self.timed(TcpStream::connect(addr)).await
    }

    async fn send_tcp(&self, stream: &mut TcpStream, wire: &[u8]) -> Result<(), DnsError> {
        let len = u16::try_from(wire.len())
            .map_err(|_| DnsError::Proto("request too large for TCP framing".to_string()))?;
        let mut framed = Vec::with_capacity(wire.len() + 2);
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(wire);

        self.timed(stream.write_all(&framed)).await
    }

    /// Read one length-prefixed message off the stream
    async fn recv_frame(&self, stream: &mut TcpStream) -> Result<Vec<u8>, DnsError> {
        let len = self.timed(stream.read_u16()).await?;
        let mut buf = vec![0u8; usize::from(len)];
        self.timed(stream.read_exact(&mut buf)).await?;

        Ok(buf)
    }

    /// Single request/response exchange over TCP
    async fn exchange_tcp(&self, request: &Message) -> Result<Message, DnsError> {
        let wire = request.to_vec()?;
        let mut stream = self.connect_tcp().await?;
        self.send_tcp(&mut stream, &wire).await?;

        let response = Message::from_vec(&self.recv_frame(&mut stream).await?)?;
        check_response(request, &response)?;
        Ok(response)
    }

    /// Single request/response exchange over UDP
    async fn exchange_udp(&self, request: &Message) -> Result<Message, DnsError> {
        let wire = request.to_vec()?;
        let addr = self.server_addr().await?;
        let bind = if addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind).await?;
        self.timed(socket.connect(addr)).await?;
        self.timed(socket.send(&wire)).await?;

        let mut buf = vec![0u8; MAX_UDP_SIZE];
        loop {
            let len = self.timed(socket.recv(&mut buf)).await?;
            let response = match Message::from_vec(&buf[..len]) {
                Ok(response) => response,
                Err(e) => {
                    debug!(error = %e, "ignoring undecodable datagram");
                    continue;
                }
            };
            // Stray answers to older queries are dropped.
            if response.id() != request.id() {
                continue;
            }

            check_response(request, &response)?;
            return Ok(response);
        }
    }
}

#[async_trait]
impl DnsTransport for TcpUdpTransport {
    #[instrument(skip(self, zone), fields(server = %self.server, zone = %zone))]
    async fn transfer(&self, zone: &Name) -> Result<Vec<Record>, DnsError> {
        let mut request = build_request(zone, RecordType::AXFR, false);

        let (wire, mut sequence) = match &self.tsig {
            Some(key) => {
                let now = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
                let (wire, sequence) = key.sign(&mut request, now)?;
                debug!(algorithm = ?key.algorithm(), "signed zone transfer request");
                (wire, Some(sequence))
            }
            None => (request.to_vec()?, None),
        };

        let mut stream = self.connect_tcp().await?;
        self.send_tcp(&mut stream, &wire).await?;

        let mut records = Vec::new();
        let mut soa_count = 0;
        let mut envelopes = 0;

        // The transfer is complete once the closing SOA arrives.
        while soa_count < 2 {
            let frame = self.recv_frame(&mut stream).await?;
            if let Some(sequence) = sequence.as_mut() {
                sequence.verify(&frame)?;
            }

            let response = Message::from_vec(&frame)?;
            check_response(&request, &response)?;
            envelopes += 1;

            if envelopes == 1
                && response
                    .answers()
                    .first()
                    .is_none_or(|rr| rr.record_type() != RecordType::SOA)
            {
                return Err(DnsError::Malformed(
                    "zone transfer did not start with SOA".to_string(),
                ));
            }

            for rr in response.answers() {
                if rr.record_type() == RecordType::SOA {
                    soa_count += 1;
                }
                records.push(rr.clone());
            }
        }

        debug!(envelopes, records = records.len(), "zone transfer complete");

        Ok(records)
    }

    #[instrument(skip(self, name), fields(server = %self.server, qname = %name))]
    async fn query_txt(&self, name: &Name) -> Result<Vec<Record>, DnsError> {
        let request = build_request(name, RecordType::TXT, true);

        let mut response = self.exchange_udp(&request).await?;
        if response.truncated() {
            debug!("UDP answer truncated, re-querying over TCP");
            response = self.exchange_tcp(&request).await?;
        }

        Ok(response.answers().to_vec())
    }
}

fn build_request(name: &Name, record_type: RecordType, recursion: bool) -> Message {
    let mut request = Message::new();
    request
        .set_id(rand::random())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(recursion)
        .add_query(Query::query(name.clone(), record_type));
    request
}

/// Reject answers to someone else's query and failed responses
///
/// NXDOMAIN is not an error: it yields an empty answer section.
fn check_response(request: &Message, response: &Message) -> Result<(), DnsError> {
    if response.id() != request.id() {
        return Err(DnsError::Malformed(format!(
            "response id {} does not match request id {}",
            response.id(),
            request.id()
        )));
    }

    match response.response_code() {
        ResponseCode::NoError | ResponseCode::NXDomain => Ok(()),
        code => Err(DnsError::Rcode(code.to_string())),
    }
}
