//! kraftlog CLI Client
//!
//! Command-line interface for querying a running broker and inspecting
//! metadata log files offline.

use std::net::TcpStream;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use kraftlog::api::is_version_supported;
use kraftlog::log::{BatchReader, RecordBody};
use kraftlog::protocol::messages::{
    ApiVersionsRequest, ApiVersionsResponse, DescribeTopicPartitionsRequest,
    DescribeTopicPartitionsResponse, FetchPartition, FetchRequest, FetchResponse, FetchTopic,
};
use kraftlog::protocol::{
    encode_frame, parse_uuid, read_frame, write_frame, ApiKey, RequestHeader, ResponseHeader,
    Versioned, Wire,
};
use kraftlog::Result;

const CLIENT_ID: &str = "kraftlog-cli";

/// kraftlog CLI
#[derive(Parser, Debug)]
#[command(name = "kraftlog-cli")]
#[command(about = "CLI for the kraftlog broker")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:9092")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the API versions the server supports
    ApiVersions {
        /// Request version
        #[arg(long, default_value = "4")]
        version: i16,
    },

    /// Describe topics and their partitions
    Describe {
        /// Topic names
        #[arg(required = true)]
        topics: Vec<String>,
    },

    /// Fetch the records of one partition
    Fetch {
        /// Topic UUID (8-4-4-4-12 form)
        topic_id: String,

        /// Partition index
        #[arg(short, long, default_value = "0")]
        partition: i32,

        /// Request version
        #[arg(long, default_value = "16")]
        version: i16,
    },

    /// Decode a metadata log segment without a server
    DumpLog {
        /// Path to a .log segment
        path: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::ApiVersions { version } => {
            let mut client = Client::connect(&args.server)?;
            let response: ApiVersionsResponse =
                client.call(ApiKey::ApiVersions, version, &ApiVersionsRequest::default())?;
            println!("error_code: {}", response.error_code);
            for api in &response.api_keys {
                println!(
                    "  key {:>3}  versions {}..={}",
                    api.api_key, api.min_version, api.max_version
                );
            }
        }
        Commands::Describe { topics } => {
            let mut client = Client::connect(&args.server)?;
            let request = DescribeTopicPartitionsRequest::new(topics);
            let response: DescribeTopicPartitionsResponse =
                client.call(ApiKey::DescribeTopicPartitions, 0, &request)?;
            for topic in &response.topics {
                println!(
                    "{} id={} error_code={}",
                    topic.name.as_deref().unwrap_or("<null>"),
                    topic.topic_id,
                    topic.error_code
                );
                for p in &topic.partitions {
                    println!(
                        "  partition {} leader={} epoch={} replicas={:?} isr={:?}",
                        p.partition_index, p.leader_id, p.leader_epoch, p.replica_nodes, p.isr_nodes
                    );
                }
            }
        }
        Commands::Fetch {
            topic_id,
            partition,
            version,
        } => {
            let topic_id = parse_uuid(&topic_id)?;
            let mut client = Client::connect(&args.server)?;
            let request = FetchRequest::new(vec![FetchTopic::new(
                topic_id,
                vec![FetchPartition::new(partition, 0)],
            )]);
            let response: FetchResponse = client.call(ApiKey::Fetch, version, &request)?;
            for topic in &response.responses {
                for p in &topic.partitions {
                    let records = p.records.as_deref().unwrap_or_default();
                    println!(
                        "{}:{} error_code={} {} record bytes",
                        topic.topic_id,
                        p.partition_index,
                        p.error_code,
                        records.len()
                    );
                    for batch in BatchReader::new(records) {
                        let batch = batch?;
                        println!(
                            "  batch offset={} records={}",
                            batch.base_offset,
                            batch.records.len()
                        );
                    }
                }
            }
        }
        Commands::DumpLog { path } => dump_log(&path)?,
    }

    Ok(())
}

fn dump_log(path: &Path) -> Result<()> {
    let data = std::fs::read(path)?;

    for batch in BatchReader::new(&data) {
        let batch = batch?;
        println!(
            "batch base_offset={} leader_epoch={} records={}",
            batch.base_offset,
            batch.partition_leader_epoch,
            batch.records.len()
        );
        for record in &batch.records {
            let offset = batch.base_offset + i64::from(record.offset_delta);
            match &record.value.body {
                RecordBody::Topic(t) => println!("  {} topic {} {}", offset, t.name, t.topic_id),
                RecordBody::Partition(p) => println!(
                    "  {} partition {}:{} leader={} replicas={:?}",
                    offset, p.topic_id, p.partition_id, p.leader, p.replicas
                ),
                RecordBody::FeatureLevel(f) => {
                    println!("  {} feature {}={}", offset, f.name, f.level)
                }
            }
        }
    }

    Ok(())
}

/// Blocking request/response client
struct Client {
    stream: TcpStream,
    next_correlation_id: i32,
}

impl Client {
    fn connect(addr: &str) -> Result<Self> {
        Ok(Self {
            stream: TcpStream::connect(addr)?,
            next_correlation_id: 1,
        })
    }

    fn call<Req: Versioned, Resp: Versioned>(
        &mut self,
        key: ApiKey,
        version: i16,
        request: &Req,
    ) -> Result<Resp> {
        let correlation_id = self.next_correlation_id;
        self.next_correlation_id += 1;

        let header =
            RequestHeader::new(key, version, correlation_id).with_client_id(CLIENT_ID);
        let frame = encode_frame(|buf| {
            header.encode(buf);
            request.encode_versioned(buf, version);
        });
        write_frame(&mut self.stream, &frame)?;

        let body = read_frame(&mut self.stream)?;
        let mut buf: &[u8] = &body;
        let response_header = ResponseHeader::decode(&mut buf, key.response_header_version())?;
        if response_header.correlation_id() != correlation_id {
            return Err(kraftlog::KraftError::Protocol(format!(
                "correlation id mismatch: sent {}, got {}",
                correlation_id,
                response_header.correlation_id()
            )));
        }

        // Unsupported ApiVersions requests are answered in the v0 layout
        let response_version = match key {
            ApiKey::ApiVersions if !is_version_supported(key, version) => 0,
            _ => version,
        };
        Resp::decode_versioned(&mut buf, response_version)
    }
}
