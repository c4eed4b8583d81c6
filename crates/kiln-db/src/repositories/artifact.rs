//! ArtifactRepository implementation for SQLite

use async_trait::async_trait;
use kiln_core::{
    ArtifactRepository, BaseContract, BaseContractId, ContractVersion, Error, NewBaseContract,
    NewContractVersion, Result, VersionId,
};

use crate::Database;

#[async_trait]
impl ArtifactRepository for Database {
    async fn create_base_contract(&self, contract: &NewBaseContract) -> Result<BaseContract> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO base_contract (name, description) VALUES (?, ?) RETURNING id",
        )
        .bind(&contract.name)
        .bind(&contract.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("base contract '{}'", contract.name)))?;

        self.get_base_contract(BaseContractId(id))
            .await?
            .ok_or_else(|| Error::BaseContractNotFound(contract.name.clone()))
    }

    async fn get_base_contract_by_name(&self, name: &str) -> Result<Option<BaseContract>> {
        let contract =
            sqlx::query_as::<_, BaseContract>("SELECT * FROM base_contract WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(contract)
    }

    async fn get_base_contract(&self, id: BaseContractId) -> Result<Option<BaseContract>> {
        let contract = sqlx::query_as::<_, BaseContract>("SELECT * FROM base_contract WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contract)
    }

    async fn create_version(&self, version: &NewContractVersion) -> Result<ContractVersion> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO contract_version (base_contract_id, version_label, bytecode, abi, constructor_args_info)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(version.base_contract_id)
        .bind(&version.version_label)
        .bind(&version.bytecode)
        .bind(&version.abi)
        .bind(&version.constructor_args_info)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_constraint(e, &format!("version '{}'", version.version_label)))?;

        self.get_version(VersionId(id))
            .await?
            .ok_or(Error::VersionNotFound(VersionId(id)))
    }

    async fn get_version(&self, id: VersionId) -> Result<Option<ContractVersion>> {
        let version =
            sqlx::query_as::<_, ContractVersion>("SELECT * FROM contract_version WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(version)
    }

    async fn list_versions(&self, base_contract: BaseContractId) -> Result<Vec<ContractVersion>> {
        let versions = sqlx::query_as::<_, ContractVersion>(
            "SELECT * FROM contract_version WHERE base_contract_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(base_contract)
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }
}
