use sqlx::SqlitePool;

use kiln_core::Error;

/// SQL schema for initializing the database
pub const SCHEMA: &str = r#"
-- Logical contract families
CREATE TABLE IF NOT EXISTS base_contract (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- Immutable artifacts (bytecode + ABI)
CREATE TABLE IF NOT EXISTS contract_version (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_contract_id INTEGER NOT NULL REFERENCES base_contract(id) ON DELETE RESTRICT,
    version_label TEXT NOT NULL,
    bytecode TEXT NOT NULL,
    abi JSON NOT NULL,
    constructor_args_info JSON NOT NULL DEFAULT '[]',
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(base_contract_id, version_label)
);

-- Blockchain endpoints
CREATE TABLE IF NOT EXISTS network (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    rpc_url TEXT NOT NULL,
    chain_id INTEGER UNIQUE NOT NULL
);

-- Addresses allowed to deploy
CREATE TABLE IF NOT EXISTS deployer (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT UNIQUE NOT NULL,
    description TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- Deployment attempts
CREATE TABLE IF NOT EXISTS deployed_contract (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_version_id INTEGER NOT NULL REFERENCES contract_version(id) ON DELETE RESTRICT,
    network_id INTEGER NOT NULL REFERENCES network(id) ON DELETE RESTRICT,
    deployer_id INTEGER NOT NULL REFERENCES deployer(id) ON DELETE RESTRICT,
    base_contract_id INTEGER NOT NULL REFERENCES base_contract(id) ON DELETE RESTRICT,
    status TEXT NOT NULL CHECK (status IN (
        'PENDING_PREPARATION', 'PENDING_SIGNATURE', 'SENT_TO_NETWORK', 'CONFIRMED', 'FAILED'
    )),
    is_current BOOLEAN NOT NULL DEFAULT FALSE,
    address TEXT,
    gas_used INTEGER CHECK (gas_used IS NULL OR gas_used >= 0),
    transaction_hash TEXT UNIQUE,
    params JSON,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(address, network_id)
);

-- At most one current deployment per (network, base contract)
CREATE UNIQUE INDEX IF NOT EXISTS idx_deployed_contract_current
    ON deployed_contract(network_id, base_contract_id) WHERE is_current = TRUE;

-- Watch directives
CREATE TABLE IF NOT EXISTS event_subscription (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deployed_contract_id INTEGER NOT NULL REFERENCES deployed_contract(id) ON DELETE RESTRICT,
    event_name TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(deployed_contract_id, event_name)
);

-- Append-only ledger of decoded events
CREATE TABLE IF NOT EXISTS global_event_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    deployed_contract_id INTEGER NOT NULL REFERENCES deployed_contract(id) ON DELETE RESTRICT,
    event_name TEXT NOT NULL,
    event_data JSON NOT NULL,
    transaction_hash TEXT UNIQUE NOT NULL,
    block_number INTEGER NOT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_global_event_log_deployment
    ON global_event_log(deployed_contract_id, block_number DESC);
"#;

/// Initialize the database schema
pub async fn init_schema(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
