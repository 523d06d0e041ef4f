//! Creates, resets, and appends commits to the healing branch (§4.11),
//! built directly on `ForgeClient`'s ref/tree/blob primitives.

use scm::types::TreeEntry;
use scm::ForgeClient;

use crate::error::HealResult;

pub struct BranchManager<'a> {
    forge: &'a ForgeClient,
    owner: String,
    repo: String,
}

impl<'a> BranchManager<'a> {
    #[must_use]
    pub fn new(forge: &'a ForgeClient, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            forge,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `createBranch(name, base)`: resets `heads/name` to `heads/base`'s
    /// sha even if the branch already existed (§4.11, §8 invariant 8).
    pub async fn create_branch(&self, name: &str, base: &str) -> HealResult<String> {
        let base_ref = self.forge.get_ref(&self.owner, &self.repo, &format!("heads/{base}")).await?;
        let base_sha = base_ref.sha;

        self.forge
            .delete_ref(&self.owner, &self.repo, &format!("heads/{name}"))
            .await?;
        self.forge
            .create_ref(&self.owner, &self.repo, &format!("heads/{name}"), &base_sha)
            .await?;

        Ok(base_sha)
    }

    /// `commitFile(branch, path, content, msg)`.
    pub async fn commit_file(
        &self,
        branch: &str,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> HealResult<String> {
        let prior = self
            .forge
            .get_file_content(&self.owner, &self.repo, path, branch)
            .await
            .ok()
            .map(|f| f.sha);

        let commit = self
            .forge
            .create_or_update_file(&self.owner, &self.repo, path, content, branch, message, prior.as_deref())
            .await?;
        Ok(commit.sha)
    }

    /// `commitMultipleFiles(branch, files[], msg)`: builds one tree and
    /// one commit on top of the branch tip, then fast-forwards the ref.
    pub async fn commit_multiple_files(
        &self,
        branch: &str,
        files: &[(String, Vec<u8>)],
        message: &str,
    ) -> HealResult<String> {
        let tip = self.get_latest_commit_sha(branch).await?;
        let tip_commit = self.forge.get_commit(&self.owner, &self.repo, &tip).await?;

        let mut entries = Vec::with_capacity(files.len());
        for (path, content) in files {
            let blob = self.forge.create_blob(&self.owner, &self.repo, content).await?;
            entries.push(TreeEntry::file(path.clone(), blob.sha));
        }

        let tree = self
            .forge
            .create_tree(&self.owner, &self.repo, &tip_commit.tree_sha, &entries)
            .await?;
        let commit = self
            .forge
            .create_commit(&self.owner, &self.repo, &tree.sha, &[tip.clone()], message)
            .await?;

        self.forge
            .update_ref(&self.owner, &self.repo, &format!("heads/{branch}"), &commit.sha, true)
            .await?;

        Ok(commit.sha)
    }

    pub async fn get_latest_commit_sha(&self, branch: &str) -> HealResult<String> {
        let r = self.forge.get_ref(&self.owner, &self.repo, &format!("heads/{branch}")).await?;
        Ok(r.sha)
    }

    pub async fn get_file_content(&self, path: &str, branch: &str) -> HealResult<Vec<u8>> {
        let f = self.forge.get_file_content(&self.owner, &self.repo, path, branch).await?;
        Ok(f.content)
    }
}
