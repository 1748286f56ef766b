//! Signet CLI — `signet` command.
//!
//! Key generation, entity lifecycle operations against a registry
//! endpoint, and an offline demo mode that runs the full lifecycle
//! against the in-memory registry.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use signet::{Agent, CreateOpts, Entity, HttpClient, MemoryRegistry, SignetKeyPair, Transport, Xid};

#[derive(Parser)]
#[command(name = "signet", version, about = "Signet identity registry client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct RegistryArgs {
    /// Registry endpoint, e.g. http://localhost:1337
    #[arg(long)]
    endpoint: String,
}

#[derive(Args)]
struct OrgArgs {
    /// Organization public key text (ends with '=')
    #[arg(long)]
    org_public_key: String,
    /// Organization private key text (ends with '=')
    #[arg(long)]
    org_private_key: String,
}

#[derive(Args)]
struct EntityKeyArgs {
    /// Entity ownership public key text
    #[arg(long)]
    public_key: String,
    /// Entity ownership private key text
    #[arg(long)]
    private_key: String,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair and print its text encodings
    Keygen,
    /// Create a new entity
    Create {
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        org: OrgArgs,
        /// Optional XID in nstype:ns:name form
        #[arg(long)]
        xid: Option<String>,
    },
    /// Fetch an entity by GUID or XID
    Fetch {
        #[command(flatten)]
        registry: RegistryArgs,
        /// GUID of the entity
        #[arg(long, conflicts_with = "xid")]
        guid: Option<String>,
        /// XID in nstype:ns:name form
        #[arg(long)]
        xid: Option<String>,
    },
    /// Set an XID on an entity
    SetXid {
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        org: OrgArgs,
        #[command(flatten)]
        keys: EntityKeyArgs,
        #[arg(long)]
        guid: String,
        /// XID in nstype:ns:name form
        #[arg(long)]
        xid: String,
    },
    /// Set a channel on an entity
    SetChannel {
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        org: OrgArgs,
        #[command(flatten)]
        keys: EntityKeyArgs,
        #[arg(long)]
        guid: String,
        /// Channel type, e.g. REST
        #[arg(long)]
        ch_type: String,
        /// Channel version, e.g. v1
        #[arg(long)]
        version: String,
        /// Channel endpoint
        #[arg(long)]
        ch_endpoint: String,
    },
    /// Rotate an entity to a brand-new ownership key
    Rekey {
        #[command(flatten)]
        registry: RegistryArgs,
        #[command(flatten)]
        keys: EntityKeyArgs,
        #[arg(long)]
        guid: String,
    },
    /// Run the full lifecycle against an in-memory registry
    Demo,
}

fn print_entity(entity: &Entity) {
    println!("guid:      {}", entity.guid);
    println!("verkey:    {}", entity.verkey);
    println!("xid:       {}", entity.xid.as_deref().unwrap_or("-"));
    println!("channel:   {}", entity.channel.as_deref().unwrap_or("-"));
    println!("prev_sign: {}", entity.prev_sign);
    if let Some(signed_at) = &entity.signed_at {
        println!("signed_at: {signed_at}");
    }
}

fn agent_for(endpoint: &str, org: Option<&OrgArgs>) -> Result<Agent> {
    let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(endpoint));
    let mut agent = Agent::new(transport);
    if let Some(org) = org {
        agent
            .set_org_keys(&org.org_public_key, &org.org_private_key)
            .context("invalid organization keys")?;
    }
    Ok(agent)
}

/// Fetch the entity and register the supplied ownership keys with the
/// agent so it can sign for it.
async fn adopt_entity(agent: &mut Agent, guid: &str, keys: &EntityKeyArgs) -> Result<Entity> {
    let entity = agent
        .fetch_entity(guid)
        .await
        .with_context(|| format!("failed to fetch entity {guid}"))?;
    agent
        .assign_entity(&entity, &keys.public_key, &keys.private_key)
        .context("invalid entity ownership keys")?;
    Ok(entity)
}

fn parse_xid(text: &str) -> Result<Xid> {
    Xid::parse(text).map_err(|e| anyhow!("{e}"))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Keygen => {
            let key_pair = SignetKeyPair::generate();
            let (pub_text, priv_text) = key_pair.export_keys();
            println!("public:  {pub_text}");
            println!("private: {priv_text}");
        }
        Command::Create { registry, org, xid } => {
            let mut agent = agent_for(&registry.endpoint, Some(&org))?;
            let opts = CreateOpts {
                xid: xid.as_deref().map(parse_xid).transpose()?,
            };
            let entity = agent.create_entity(opts).await?;
            let (pub_text, priv_text) = agent
                .ownership_key_set(&entity.guid)
                .expect("key set stored on successful create")
                .export_ownership_key_pair();
            print_entity(&entity);
            println!("ownership public:  {pub_text}");
            println!("ownership private: {priv_text}");
        }
        Command::Fetch {
            registry,
            guid,
            xid,
        } => {
            let agent = agent_for(&registry.endpoint, None)?;
            let entity = match (guid, xid) {
                (Some(guid), _) => agent.fetch_entity(&guid).await?,
                (None, Some(xid)) => {
                    let xid = parse_xid(&xid)?;
                    agent
                        .fetch_entity_by_xid(&xid.nstype, &xid.ns, &xid.name)
                        .await?
                }
                (None, None) => return Err(anyhow!("either --guid or --xid is required")),
            };
            print_entity(&entity);
        }
        Command::SetXid {
            registry,
            org,
            keys,
            guid,
            xid,
        } => {
            let mut agent = agent_for(&registry.endpoint, Some(&org))?;
            let mut entity = adopt_entity(&mut agent, &guid, &keys).await?;
            let xid = parse_xid(&xid)?;
            agent
                .set_xid(&mut entity, &xid.nstype, &xid.ns, &xid.name)
                .await?;
            print_entity(&entity);
        }
        Command::SetChannel {
            registry,
            org,
            keys,
            guid,
            ch_type,
            version,
            ch_endpoint,
        } => {
            let mut agent = agent_for(&registry.endpoint, Some(&org))?;
            let mut entity = adopt_entity(&mut agent, &guid, &keys).await?;
            agent
                .set_channel(&mut entity, &ch_type, &version, &ch_endpoint)
                .await?;
            print_entity(&entity);
        }
        Command::Rekey {
            registry,
            keys,
            guid,
        } => {
            let mut agent = agent_for(&registry.endpoint, None)?;
            let mut entity = adopt_entity(&mut agent, &guid, &keys).await?;
            agent.rekey(&mut entity).await?;
            let (pub_text, priv_text) = agent
                .ownership_key_set(&entity.guid)
                .expect("key set stored on successful rekey")
                .export_ownership_key_pair();
            print_entity(&entity);
            println!("new ownership public:  {pub_text}");
            println!("new ownership private: {priv_text}");
        }
        Command::Demo => {
            let transport: Arc<dyn Transport> = Arc::new(MemoryRegistry::new());
            let mut agent = Agent::new(transport);
            let org = SignetKeyPair::generate();
            let (org_pub, org_priv) = org.export_keys();
            agent.set_org_keys(&org_pub, &org_priv)?;

            println!("== create");
            let mut entity = agent.create_entity(CreateOpts::default()).await?;
            print_entity(&entity);

            println!("== set-channel REST#v1#abc123");
            agent.set_channel(&mut entity, "REST", "v1", "abc123").await?;
            print_entity(&entity);

            println!("== set-xid dn:example.com:x1");
            agent.set_xid(&mut entity, "dn", "example.com", "x1").await?;
            print_entity(&entity);

            println!("== rekey");
            agent.rekey(&mut entity).await?;
            print_entity(&entity);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse()).await
}
