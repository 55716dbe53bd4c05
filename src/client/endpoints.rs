//! Per-endpoint methods of [`IpfsClient`].

use super::{get_property, get_string_property, IpfsClient};
use crate::aggregation::aggregate_add_reply;
use crate::errors::{IpfsError, IpfsResult};
use crate::types::{AddedFile, FileUpload, NodeId};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// Whether `pin_rm` also unpins what the object links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinRmOptions {
    /// Unpin only the object itself.
    NonRecursive,
    /// Unpin the object and everything below it.
    #[default]
    Recursive,
}

impl IpfsClient {
    /// Identity of the daemon's node (`ID`, `PublicKey`, `Addresses`, ...).
    pub fn id(&self) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("id", &[])?, &[])
    }

    /// Identity of the daemon's node, typed.
    pub fn node_id(&self) -> IpfsResult<NodeId> {
        let reply = self.id()?;
        get_property(&reply, "ID", 0)?;
        serde_json::from_value(reply)
            .map_err(|e| IpfsError::UnexpectedReply(format!("invalid id reply: {}", e)))
    }

    /// Daemon version information.
    pub fn version(&self) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("version", &[])?, &[])
    }

    /// Reads one configuration key, or the whole configuration when `key` is empty.
    pub fn config_get(&self, key: &str) -> IpfsResult<Value> {
        if key.is_empty() {
            return self.fetch_json(&self.make_url("config/show", &[])?, &[]);
        }

        let reply = self.fetch_json(&self.make_url("config", &[("arg", key)])?, &[])?;
        Ok(get_property(&reply, "Value", 0)?.clone())
    }

    /// Sets one configuration key to a JSON value.
    pub fn config_set(&self, key: &str, value: &Value) -> IpfsResult<()> {
        let value = value.to_string();
        let url = self.make_url("config", &[("arg", key), ("arg", value.as_str())])?;
        self.fetch_json(&url, &[])?;
        Ok(())
    }

    /// Replaces the whole configuration.
    pub fn config_replace(&self, config: &Value) -> IpfsResult<()> {
        let upload = FileUpload::contents("new_config.json", config.to_string());
        self.fetch(&self.make_url("config/replace", &[])?, &[upload], &mut std::io::sink())
    }

    /// Streams a raw block into `sink`.
    pub fn block_get(&self, block_id: &str, sink: &mut dyn Write) -> IpfsResult<()> {
        self.fetch(&self.make_url("block/get", &[("arg", block_id)])?, &[], sink)
    }

    /// Stores a raw block and returns its stat (`Key`, `Size`).
    pub fn block_put(&self, block: FileUpload) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("block/put", &[])?, &[block])
    }

    /// Stat of a raw block.
    pub fn block_stat(&self, block_id: &str) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("block/stat", &[("arg", block_id)])?, &[])
    }

    /// Uploads files and returns one record per file, in upload order.
    pub fn files_add(&self, files: &[FileUpload]) -> IpfsResult<Vec<AddedFile>> {
        let url = self.make_url("add", &[("progress", "true")])?;
        let mut body = Vec::new();
        self.fetch(&url, files, &mut body)?;

        let added = aggregate_add_reply(body.as_slice())?;
        debug!(parts = files.len(), records = added.len(), "files added");
        Ok(added)
    }

    /// Streams the contents of `path` into `sink`.
    pub fn files_get(&self, path: &str, sink: &mut dyn Write) -> IpfsResult<()> {
        self.fetch(&self.make_url("cat", &[("arg", path)])?, &[], sink)
    }

    /// Lists a directory.
    pub fn files_ls(&self, path: &str) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("file/ls", &[("arg", path)])?, &[])
    }

    /// Creates an empty object and returns its hash.
    pub fn object_new(&self) -> IpfsResult<String> {
        let reply = self.fetch_json(&self.make_url("object/new", &[])?, &[])?;
        get_string_property(&reply, "Hash", 0)
    }

    /// Raw data of an object.
    pub fn object_data(&self, object_id: &str) -> IpfsResult<Vec<u8>> {
        self.fetch_bytes(&self.make_url("object/data", &[("arg", object_id)])?)
    }

    /// Pins an object, checking that the daemon reports it as pinned.
    pub fn pin_add(&self, object_id: &str) -> IpfsResult<()> {
        let reply = self.fetch_json(&self.make_url("pin/add", &[("arg", object_id)])?, &[])?;

        let pins = get_property(&reply, "Pins", 0)?;
        let pinned = pins
            .as_array()
            .map(|pins| pins.iter().any(|pin| pin.as_str() == Some(object_id)))
            .unwrap_or(false);
        if !pinned {
            return Err(IpfsError::UnexpectedReply(format!(
                "request to pin \"{}\" got a result that does not contain it as pinned: {}",
                object_id, reply
            )));
        }
        Ok(())
    }

    /// Unpins an object.
    pub fn pin_rm(&self, object_id: &str, options: PinRmOptions) -> IpfsResult<()> {
        let recursive = match options {
            PinRmOptions::Recursive => "true",
            PinRmOptions::NonRecursive => "false",
        };
        let url = self.make_url("pin/rm", &[("arg", object_id), ("recursive", recursive)])?;
        self.fetch_json(&url, &[])?;
        Ok(())
    }

    /// Pinned objects.
    pub fn pin_ls(&self) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("pin/ls", &[])?, &[])
    }

    /// Connected peers.
    pub fn swarm_peers(&self) -> IpfsResult<Value> {
        self.fetch_json(&self.make_url("swarm/peers", &[])?, &[])
    }

    /// Connects to a peer multiaddress.
    pub fn swarm_connect(&self, peer: &str) -> IpfsResult<()> {
        self.fetch_json(&self.make_url("swarm/connect", &[("arg", peer)])?, &[])?;
        Ok(())
    }
}
