use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TYPE mangapulse.role AS ENUM ('user', 'moderator', 'admin');
                CREATE TYPE mangapulse.chat_kind AS ENUM ('dm', 'group');
                CREATE TYPE mangapulse.chat_member_role AS ENUM ('member', 'owner');
                CREATE TYPE mangapulse.verification_purpose AS ENUM ('signup', 'email_change');

                CREATE TABLE mangapulse.users (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    email text NOT NULL UNIQUE,
                    password text,
                    display_name text,
                    nickname text,
                    email_verified_at timestamptz,
                    role mangapulse.role NOT NULL DEFAULT 'user',
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );

                CREATE TABLE mangapulse.sessions (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    user_id uuid NOT NULL REFERENCES mangapulse.users (id) ON DELETE CASCADE,
                    token_digest text NOT NULL UNIQUE,
                    user_agent text,
                    ip_address text,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    last_used_at timestamptz NOT NULL DEFAULT now(),
                    expires_at timestamptz NOT NULL
                );
                CREATE INDEX sessions_user_id_idx ON mangapulse.sessions (user_id);
                CREATE INDEX sessions_expires_at_idx ON mangapulse.sessions (expires_at);

                CREATE TABLE mangapulse.verification_tokens (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    email text NOT NULL,
                    token_digest text NOT NULL UNIQUE,
                    purpose mangapulse.verification_purpose NOT NULL DEFAULT 'signup',
                    expires_at timestamptz NOT NULL,
                    used_at timestamptz,
                    created_at timestamptz NOT NULL DEFAULT now()
                );
                CREATE INDEX verification_tokens_email_idx ON mangapulse.verification_tokens (email);

                CREATE TABLE mangapulse.oauth_states (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    state text NOT NULL UNIQUE,
                    code_verifier text NOT NULL,
                    nonce text NOT NULL,
                    redirect_to text,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    expires_at timestamptz NOT NULL
                );

                CREATE TABLE mangapulse.chats (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    kind mangapulse.chat_kind NOT NULL DEFAULT 'dm',
                    name text,
                    pinned_message_id uuid,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );

                CREATE TABLE mangapulse.chat_members (
                    chat_id uuid NOT NULL REFERENCES mangapulse.chats (id) ON DELETE CASCADE,
                    user_id uuid NOT NULL REFERENCES mangapulse.users (id) ON DELETE CASCADE,
                    role mangapulse.chat_member_role NOT NULL DEFAULT 'member',
                    joined_at timestamptz NOT NULL DEFAULT now(),
                    PRIMARY KEY (chat_id, user_id)
                );

                CREATE TABLE mangapulse.chat_messages (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    chat_id uuid NOT NULL REFERENCES mangapulse.chats (id) ON DELETE CASCADE,
                    sender_id uuid NOT NULL REFERENCES mangapulse.users (id),
                    body text NOT NULL,
                    reactions jsonb NOT NULL DEFAULT '{}',
                    deleted_at timestamptz,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );
                CREATE INDEX chat_messages_chat_id_created_at_idx
                    ON mangapulse.chat_messages (chat_id, created_at DESC);

                ALTER TABLE mangapulse.chats
                    ADD CONSTRAINT chats_pinned_message_id_fkey
                    FOREIGN KEY (pinned_message_id)
                    REFERENCES mangapulse.chat_messages (id) ON DELETE SET NULL;

                CREATE TABLE mangapulse.titles (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    slug text NOT NULL UNIQUE,
                    name text NOT NULL,
                    author text,
                    description text,
                    cover_key text,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );

                CREATE TABLE mangapulse.chapters (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    title_id uuid NOT NULL REFERENCES mangapulse.titles (id) ON DELETE CASCADE,
                    number double precision NOT NULL,
                    name text,
                    page_count integer NOT NULL,
                    published_at timestamptz,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );
                CREATE INDEX chapters_title_id_number_idx ON mangapulse.chapters (title_id, number);

                CREATE TABLE mangapulse.comments (
                    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                    title_id uuid NOT NULL REFERENCES mangapulse.titles (id) ON DELETE CASCADE,
                    user_id uuid NOT NULL REFERENCES mangapulse.users (id) ON DELETE CASCADE,
                    body text NOT NULL,
                    deleted_at timestamptz,
                    created_at timestamptz NOT NULL DEFAULT now(),
                    updated_at timestamptz NOT NULL DEFAULT now()
                );
                CREATE INDEX comments_title_id_created_at_idx
                    ON mangapulse.comments (title_id, created_at DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS mangapulse.comments;
                DROP TABLE IF EXISTS mangapulse.chapters;
                DROP TABLE IF EXISTS mangapulse.titles;
                ALTER TABLE mangapulse.chats DROP CONSTRAINT IF EXISTS chats_pinned_message_id_fkey;
                DROP TABLE IF EXISTS mangapulse.chat_messages;
                DROP TABLE IF EXISTS mangapulse.chat_members;
                DROP TABLE IF EXISTS mangapulse.chats;
                DROP TABLE IF EXISTS mangapulse.oauth_states;
                DROP TABLE IF EXISTS mangapulse.verification_tokens;
                DROP TABLE IF EXISTS mangapulse.sessions;
                DROP TABLE IF EXISTS mangapulse.users;
                DROP TYPE IF EXISTS mangapulse.verification_purpose;
                DROP TYPE IF EXISTS mangapulse.chat_member_role;
                DROP TYPE IF EXISTS mangapulse.chat_kind;
                DROP TYPE IF EXISTS mangapulse.role;
                "#,
            )
            .await?;

        Ok(())
    }
}
